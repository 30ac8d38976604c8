//! Per-draft metadata: subschema locations, vocabularies, meta-schema URLs.
//!
//! Each draft extends the previous draft's subschema-position table, so the
//! tables are unions. The registry is process-wide immutable data.

use lazy_static::lazy_static;

use serde_json::{Map, Value};

use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::schema::{SchemaIndex, Schemas};
use crate::uri::{split_ref, JsonPointer};

/// A published JSON Schema draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Draft {
    V4,
    V6,
    V7,
    V2019_09,
    V2020_12,
}

/// Where inside a keyword's value subschemas live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// Every property value of an object.
    Prop,
    /// Every element of an array.
    Item,
}

/// A path of positions from the keyword value down to its subschemas.
pub(crate) type SchemaPosition = &'static [Position];

/// keyword -> subschema positions, sorted by keyword for deterministic walks.
pub(crate) type Subschemas = Vec<(&'static str, &'static [SchemaPosition])>;

use Position::{Item, Prop};

const SELF: SchemaPosition = &[];
const ITEMS: SchemaPosition = &[Item];
const PROPS: SchemaPosition = &[Prop];

const DRAFT4_SUBSCHEMAS: &[(&str, &[SchemaPosition])] = &[
    ("additionalItems", &[SELF]),
    ("additionalProperties", &[SELF]),
    ("allOf", &[ITEMS]),
    ("anyOf", &[ITEMS]),
    ("definitions", &[PROPS]),
    ("dependencies", &[PROPS]),
    ("items", &[SELF, ITEMS]),
    ("not", &[SELF]),
    ("oneOf", &[ITEMS]),
    ("patternProperties", &[PROPS]),
    ("properties", &[PROPS]),
];

const DRAFT6_ADDED: &[(&str, &[SchemaPosition])] =
    &[("contains", &[SELF]), ("propertyNames", &[SELF])];

const DRAFT7_ADDED: &[(&str, &[SchemaPosition])] = &[
    ("else", &[SELF]),
    ("if", &[SELF]),
    ("then", &[SELF]),
];

const DRAFT2019_ADDED: &[(&str, &[SchemaPosition])] = &[
    ("$defs", &[PROPS]),
    ("contentSchema", &[SELF]),
    ("dependentSchemas", &[PROPS]),
    ("unevaluatedItems", &[SELF]),
    ("unevaluatedProperties", &[SELF]),
];

const DRAFT2020_ADDED: &[(&str, &[SchemaPosition])] = &[("prefixItems", &[ITEMS])];

fn extend(base: &Subschemas, added: &[(&'static str, &'static [SchemaPosition])]) -> Subschemas {
    let mut table = base.clone();
    table.extend_from_slice(added);
    table.sort_by_key(|(kw, _)| *kw);
    table
}

lazy_static! {
    static ref SUBSCHEMAS_V4: Subschemas = extend(&Vec::new(), DRAFT4_SUBSCHEMAS);
    static ref SUBSCHEMAS_V6: Subschemas = extend(&SUBSCHEMAS_V4, DRAFT6_ADDED);
    static ref SUBSCHEMAS_V7: Subschemas = extend(&SUBSCHEMAS_V6, DRAFT7_ADDED);
    static ref SUBSCHEMAS_V2019: Subschemas = extend(&SUBSCHEMAS_V7, DRAFT2019_ADDED);
    static ref SUBSCHEMAS_V2020: Subschemas = extend(&SUBSCHEMAS_V2019, DRAFT2020_ADDED);
}

const VOCABS_2019: &[&str] = &["core", "applicator", "validation", "meta-data", "format", "content"];
const DEFAULT_VOCABS_2019: &[&str] = &["core", "applicator", "validation"];
const VOCABS_2020: &[&str] = &[
    "core",
    "applicator",
    "unevaluated",
    "validation",
    "meta-data",
    "format-annotation",
    "format-assertion",
    "content",
];
const DEFAULT_VOCABS_2020: &[&str] = &["core", "applicator", "unevaluated", "validation"];

impl Draft {
    /// The latest supported draft.
    pub fn latest() -> Draft {
        Draft::V2020_12
    }

    pub(crate) fn version(self) -> u16 {
        match self {
            Draft::V4 => 4,
            Draft::V6 => 6,
            Draft::V7 => 7,
            Draft::V2019_09 => 2019,
            Draft::V2020_12 => 2020,
        }
    }

    /// The meta-schema URL identifying this draft.
    pub fn url(self) -> &'static str {
        match self {
            Draft::V4 => "http://json-schema.org/draft-04/schema",
            Draft::V6 => "http://json-schema.org/draft-06/schema",
            Draft::V7 => "http://json-schema.org/draft-07/schema",
            Draft::V2019_09 => "https://json-schema.org/draft/2019-09/schema",
            Draft::V2020_12 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    pub(crate) fn id_keyword(self) -> &'static str {
        match self {
            Draft::V4 => "id",
            _ => "$id",
        }
    }

    pub(crate) fn subschemas(self) -> &'static Subschemas {
        match self {
            Draft::V4 => &SUBSCHEMAS_V4,
            Draft::V6 => &SUBSCHEMAS_V6,
            Draft::V7 => &SUBSCHEMAS_V7,
            Draft::V2019_09 => &SUBSCHEMAS_V2019,
            Draft::V2020_12 => &SUBSCHEMAS_V2020,
        }
    }

    pub(crate) fn vocab_prefix(self) -> &'static str {
        match self {
            Draft::V2019_09 => "https://json-schema.org/draft/2019-09/vocab/",
            Draft::V2020_12 => "https://json-schema.org/draft/2020-12/vocab/",
            _ => "",
        }
    }

    pub(crate) fn all_vocabs(self) -> &'static [&'static str] {
        match self {
            Draft::V2019_09 => VOCABS_2019,
            Draft::V2020_12 => VOCABS_2020,
            _ => &[],
        }
    }

    pub(crate) fn default_vocabs(self) -> &'static [&'static str] {
        match self {
            Draft::V2019_09 => DEFAULT_VOCABS_2019,
            Draft::V2020_12 => DEFAULT_VOCABS_2020,
            _ => &[],
        }
    }

    /// Match a `$schema` URL against the known meta-schema URLs.
    ///
    /// The `http`/`https` distinction is erased and a non-empty fragment
    /// disqualifies the URL.
    pub fn from_url(url: &str) -> Option<Draft> {
        let (url, frag) = split_ref(url);
        if !frag.is_empty() {
            return None;
        }
        let url = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))?;
        match url {
            "json-schema.org/schema" => Some(Draft::latest()),
            "json-schema.org/draft/2020-12/schema" => Some(Draft::V2020_12),
            "json-schema.org/draft/2019-09/schema" => Some(Draft::V2019_09),
            "json-schema.org/draft-07/schema" => Some(Draft::V7),
            "json-schema.org/draft-06/schema" => Some(Draft::V6),
            "json-schema.org/draft-04/schema" => Some(Draft::V4),
            _ => None,
        }
    }

    /// The `$id` (or `id`) of a schema object, fragment dropped.
    ///
    /// Before 2019-09 every sibling of `$ref` is ignored, ids included.
    pub(crate) fn get_id<'a>(self, obj: &'a Map<String, Value>) -> Option<&'a str> {
        if self.version() < 2019 && obj.contains_key("$ref") {
            return None;
        }
        let id = obj.get(self.id_keyword())?.as_str()?;
        let (id, _) = split_ref(id);
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// Read the `$vocabulary` of a meta-schema document.
    ///
    /// Returns `None` when the draft predates vocabularies or the document
    /// declares none. Unknown vocabularies that are required fail; optional
    /// ones are skipped.
    pub(crate) fn get_vocabs(
        self,
        url: &str,
        meta_doc: &Value,
    ) -> Result<Option<Vec<String>>, CompileError> {
        if self.version() < 2019 {
            return Ok(None);
        }
        let Some(vocab_obj) = meta_doc.get("$vocabulary").and_then(Value::as_object) else {
            return Ok(None);
        };

        let mut vocabs = Vec::new();
        for (vocab, required) in vocab_obj {
            if !matches!(required, Value::Bool(true)) {
                continue;
            }
            let name = match vocab.strip_prefix(self.vocab_prefix()) {
                Some(name) if self.all_vocabs().iter().any(|v| *v == name) => name,
                _ => {
                    return Err(CompileError::UnsupportedVocabulary {
                        url: url.to_string(),
                        vocabulary: vocab.clone(),
                    })
                }
            };
            if !vocabs.iter().any(|v| v == name) {
                vocabs.push(name.to_string());
            }
        }
        Ok(Some(vocabs))
    }

    /// Validate a schema document against this draft's meta-schema.
    pub(crate) fn validate_schema(self, url: &str, doc: &Value) -> Result<(), CompileError> {
        let metas = &*META_SCHEMAS;
        let idx = metas.by_version(self);
        if let Err(err) = metas.schemas.validate(doc, idx) {
            return Err(CompileError::SchemaValidation {
                url: url.to_string(),
                src: Box::new(err),
            });
        }
        Ok(())
    }
}

/// A draft plus the active vocabulary set.
#[derive(Debug, Clone)]
pub(crate) struct Dialect {
    pub(crate) draft: Draft,
    /// `None` means the draft's default vocabularies.
    pub(crate) vocabs: Option<Vec<String>>,
}

impl Dialect {
    pub(crate) fn new(draft: Draft) -> Self {
        Self { draft, vocabs: None }
    }

    pub(crate) fn has_vocab(&self, name: &str) -> bool {
        if name == "core" || self.draft.version() < 2019 {
            return true;
        }
        match &self.vocabs {
            Some(vocabs) => vocabs.iter().any(|v| v == name),
            None => self.draft.default_vocabs().iter().any(|v| *v == name),
        }
    }
}

/// Pre-compiled meta-schemas, built once per process.
pub(crate) struct MetaSchemas {
    pub(crate) schemas: Schemas,
    v4: SchemaIndex,
    v6: SchemaIndex,
    v7: SchemaIndex,
    v2019: SchemaIndex,
    v2020: SchemaIndex,
}

impl MetaSchemas {
    fn bootstrap() -> MetaSchemas {
        let mut compiler = Compiler::new();
        compiler.enable_format_assertions();
        let mut compile = |draft: Draft| {
            compiler
                .compile(draft.url())
                .unwrap_or_else(|err| panic!("embedded metaschema for {draft:?}: {err}"))
        };
        let v4 = compile(Draft::V4);
        let v6 = compile(Draft::V6);
        let v7 = compile(Draft::V7);
        let v2019 = compile(Draft::V2019_09);
        let v2020 = compile(Draft::V2020_12);
        MetaSchemas {
            schemas: compiler.into_schemas(),
            v4,
            v6,
            v7,
            v2019,
            v2020,
        }
    }

    fn by_version(&self, draft: Draft) -> SchemaIndex {
        match draft {
            Draft::V4 => self.v4,
            Draft::V6 => self.v6,
            Draft::V7 => self.v7,
            Draft::V2019_09 => self.v2019,
            Draft::V2020_12 => self.v2020,
        }
    }
}

lazy_static! {
    pub(crate) static ref META_SCHEMAS: MetaSchemas = MetaSchemas::bootstrap();
}

/// Collect the subschema locations of one schema object, in keyword order.
pub(crate) fn subschema_locations<'a>(
    draft: Draft,
    obj: &'a Map<String, Value>,
    ptr: &JsonPointer,
) -> Vec<(JsonPointer, &'a Value)> {
    let mut out = Vec::new();
    for (kw, positions) in draft.subschemas() {
        let Some(v) = obj.get(*kw) else { continue };
        let kw_ptr = ptr.append(kw);
        for sp in *positions {
            collect_position(sp, v, &kw_ptr, &mut out);
        }
    }
    out
}

fn collect_position<'a>(
    sp: &[Position],
    v: &'a Value,
    ptr: &JsonPointer,
    out: &mut Vec<(JsonPointer, &'a Value)>,
) {
    match sp.split_first() {
        None => out.push((ptr.clone(), v)),
        Some((Position::Prop, rest)) => {
            if let Value::Object(obj) = v {
                for (name, pv) in obj {
                    collect_position(rest, pv, &ptr.append(name), out);
                }
            }
        }
        Some((Position::Item, rest)) => {
            if let Value::Array(arr) = v {
                for (i, item) in arr.iter().enumerate() {
                    collect_position(rest, item, &ptr.append(&i.to_string()), out);
                }
            }
        }
    }
}
