//! Schema compilation.
//!
//! Compilation is two-phase. Enqueuing a location allocates its arena slot
//! immediately and hands back a stable index, so `$ref` targets resolve to
//! indices before they are filled; the queue loop then fills every slot.
//! Forward and cyclic references need no recursion and no back-patching.

use std::collections::{HashMap, VecDeque};

use serde_json::{Map, Number, Value};
use url::Url;

use crate::content::{builtin_decoders, builtin_media_types, Decoder, MediaType};
use crate::draft::{Dialect, Draft};
use crate::error::{BoxError, CompileError};
use crate::format::{builtin_formats, Format};
use crate::loader::UrlLoader;
use crate::root::Roots;
use crate::schema::{
    Additional, Dependency, DynamicRef, Items, Schema, SchemaIndex, Schemas,
};
use crate::uri::{Fragment, UrlFrag, UrlPtr};
use crate::value::{Type, Types};

/// A compiled regular expression.
///
/// The default engine wraps the `regex` crate; substitute one with
/// [`Compiler::use_regexp_engine`] when ECMA-262 behavior is needed.
pub trait Regexp: Send + Sync {
    fn matches(&self, s: &str) -> bool;
    fn as_str(&self) -> &str;
}

/// Compiles a pattern string into a [`Regexp`].
pub type RegexpEngine = fn(&str) -> Result<Box<dyn Regexp>, BoxError>;

struct StdRegexp(regex::Regex);

impl Regexp for StdRegexp {
    fn matches(&self, s: &str) -> bool {
        self.0.is_match(s)
    }

    fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn std_regexp_engine(pattern: &str) -> Result<Box<dyn Regexp>, BoxError> {
    Ok(Box::new(StdRegexp(regex::Regex::new(pattern)?)))
}

/// Compiles schema documents into a [`Schemas`] arena.
///
/// A compiler owns its loader cache, resource graph and arena; compiled
/// schemas stay valid for the compiler's lifetime and can be shared once
/// extracted with [`Compiler::into_schemas`].
pub struct Compiler {
    roots: Roots,
    schemas: Schemas,
    formats: HashMap<String, Format>,
    decoders: HashMap<String, Decoder>,
    media_types: HashMap<String, MediaType>,
    regexp_engine: RegexpEngine,
    assert_format: bool,
    assert_content: bool,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler").finish_non_exhaustive()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            roots: Roots::new(),
            schemas: Schemas::new(),
            formats: builtin_formats()
                .into_iter()
                .map(|f| (f.name.clone(), f))
                .collect(),
            decoders: builtin_decoders()
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
            media_types: builtin_media_types()
                .into_iter()
                .map(|m| (m.name.clone(), m))
                .collect(),
            regexp_engine: std_regexp_engine,
            assert_format: false,
            assert_content: false,
        }
    }

    /// Replace the loader consulted for unseen URLs.
    pub fn use_loader(&mut self, loader: Box<dyn UrlLoader>) {
        self.roots.loader.use_loader(loader);
    }

    /// Replace the regex engine used for `pattern` and `patternProperties`.
    pub fn use_regexp_engine(&mut self, engine: RegexpEngine) {
        self.regexp_engine = engine;
    }

    pub fn register_format(&mut self, format: Format) {
        self.formats.insert(format.name.clone(), format);
    }

    pub fn register_content_encoding(&mut self, decoder: Decoder) {
        self.decoders.insert(decoder.name.clone(), decoder);
    }

    pub fn register_content_media_type(&mut self, media_type: MediaType) {
        self.media_types.insert(media_type.name.clone(), media_type);
    }

    /// Treat `format` as an assertion even where the draft treats it as an
    /// annotation.
    pub fn enable_format_assertions(&mut self) {
        self.assert_format = true;
    }

    /// Treat the content keywords as assertions. They are annotations in
    /// every draft by default.
    pub fn enable_content_assertions(&mut self) {
        self.assert_content = true;
    }

    /// Validate every loaded document against its meta-schema before use.
    pub fn assert_vocabs(&mut self) {
        self.roots.assert_vocabs = true;
    }

    /// Draft assumed for documents without `$schema`. Defaults to the
    /// latest supported draft.
    pub fn set_default_draft(&mut self, draft: Draft) {
        self.roots.default_draft = draft;
    }

    /// Pre-seed the document for `loc`, bypassing the loader.
    ///
    /// # Errors
    ///
    /// Fails if `loc` cannot be interpreted as a URL or carries a fragment.
    pub fn add_resource(&mut self, loc: &str, doc: Value) -> Result<(), CompileError> {
        let uf = UrlFrag::parse(loc)?;
        if !matches!(&uf.frag, Fragment::JsonPointer(ptr) if ptr.is_empty()) {
            return Err(CompileError::ParseUrlError {
                url: loc.to_string(),
            });
        }
        self.roots.loader.add_doc(uf.url, doc);
        Ok(())
    }

    pub fn schemas(&self) -> &Schemas {
        &self.schemas
    }

    /// Give up the compiler, keeping the immutable compiled arena.
    pub fn into_schemas(self) -> Schemas {
        self.schemas
    }

    /// Compile the schema at `loc` (a file path or absolute URL, with an
    /// optional fragment).
    ///
    /// # Errors
    ///
    /// All compile errors are fatal to this call; the arena is unwound so
    /// no partially compiled schema survives.
    pub fn compile(&mut self, loc: &str) -> Result<SchemaIndex, CompileError> {
        let uf = UrlFrag::parse(loc)?;
        let checkpoint = self.schemas.len();
        match self.do_compile(&uf) {
            Ok(idx) => Ok(idx),
            Err(err) => {
                self.schemas.rollback(checkpoint);
                Err(err)
            }
        }
    }

    fn do_compile(&mut self, uf: &UrlFrag) -> Result<SchemaIndex, CompileError> {
        let up = self.roots.resolve(uf)?;
        let mut queue = VecDeque::new();
        let idx = self.enqueue(&mut queue, up);
        while let Some(up) = queue.pop_front() {
            self.compile_one(&up, &mut queue)?;
        }
        Ok(idx)
    }

    /// Phase 1: allocate (or find) the arena slot for a location.
    fn enqueue(&mut self, queue: &mut VecDeque<UrlPtr>, up: UrlPtr) -> SchemaIndex {
        if let Some(idx) = self.schemas.index_of(&up) {
            return idx;
        }
        let idx = self.schemas.insert_placeholder(up.clone());
        queue.push_back(up);
        idx
    }

    /// Phase 2: fill one slot.
    fn compile_one(
        &mut self,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<(), CompileError> {
        let root = self.roots.get(&up.url);
        let v = up.lookup(&root.doc)?.clone();
        let dialect = root.dialect_of(&up.ptr).clone();
        let res = root.resource_of(&up.ptr);
        let res_ptr = res.ptr.clone();
        let base = res.id.clone();
        let dynamic_anchors: Vec<_> = if res_ptr == up.ptr {
            res.dynamic_anchors
                .iter()
                .map(|name| (name.clone(), res.anchors[name].clone()))
                .collect()
        } else {
            Vec::new()
        };

        let idx = self
            .schemas
            .index_of(up)
            .expect("queued locations have slots");
        let mut sch = Schema::placeholder(up.clone(), idx);
        sch.draft_version = dialect.draft.version();
        sch.resource = self.enqueue(
            queue,
            UrlPtr {
                url: up.url.clone(),
                ptr: res_ptr,
            },
        );
        for (name, ptr) in dynamic_anchors {
            let target = UrlPtr {
                url: up.url.clone(),
                ptr,
            };
            let target_idx = self.enqueue(queue, target);
            sch.dynamic_anchors.insert(name, target_idx);
        }

        match &v {
            Value::Bool(b) => sch.boolean = Some(*b),
            Value::Object(obj) => {
                self.compile_object(&mut sch, obj, &dialect, &base, up, queue)?
            }
            _ => {
                return Err(CompileError::NotSchema {
                    url: up.to_string(),
                })
            }
        }
        self.schemas.set(idx, sch);
        Ok(())
    }

    fn compile_object(
        &mut self,
        sch: &mut Schema,
        obj: &Map<String, Value>,
        dialect: &Dialect,
        base: &Url,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<(), CompileError> {
        let version = dialect.draft.version();

        self.compile_core(sch, obj, version, base, up, queue)?;
        if version < 2019 && sch.ref_.is_some() {
            // every sibling of $ref is ignored
            return Ok(());
        }

        if dialect.has_vocab("applicator") {
            self.compile_applicator(sch, obj, version, up, queue)?;
        }
        let uneval_active = match version {
            2019 => dialect.has_vocab("applicator"),
            v if v >= 2020 => dialect.has_vocab("unevaluated"),
            _ => false,
        };
        if uneval_active {
            sch.unevaluated_properties = self.sub_schema(obj, "unevaluatedProperties", up, queue);
            sch.unevaluated_items = self.sub_schema(obj, "unevaluatedItems", up, queue);
        }
        if dialect.has_vocab("validation") {
            self.compile_validation(sch, obj, version, up, queue)?;
        }

        let format_asserts = self.assert_format
            || match version {
                2019 => dialect
                    .vocabs
                    .as_ref()
                    .is_some_and(|v| v.iter().any(|n| n == "format")),
                v if v >= 2020 => dialect.has_vocab("format-assertion"),
                _ => false,
            };
        if format_asserts {
            if let Some(v) = obj.get("format") {
                let name = v
                    .as_str()
                    .ok_or_else(|| kw_err(up, "format"))?;
                // unknown formats stay annotations
                sch.format = self.formats.get(name).cloned();
            }
        }

        if self.assert_content && version >= 7 {
            self.compile_content(sch, obj, version, up, queue)?;
        }
        Ok(())
    }

    fn compile_core(
        &mut self,
        sch: &mut Schema,
        obj: &Map<String, Value>,
        version: u16,
        base: &Url,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<(), CompileError> {
        if let Some(v) = obj.get("$ref") {
            let ref_ = v.as_str().ok_or_else(|| kw_err(up, "$ref"))?;
            sch.ref_ = Some(self.schema_ref(ref_, base, queue)?);
        }

        if version == 2019 {
            if let Some(v) = obj.get("$recursiveRef") {
                if v.as_str() != Some("#") {
                    return Err(kw_err(up, "$recursiveRef"));
                }
                sch.recursive_ref = Some(self.schema_ref("#", base, queue)?);
            }
            if let Some(v) = obj.get("$recursiveAnchor") {
                sch.recursive_anchor = v
                    .as_bool()
                    .ok_or_else(|| kw_err(up, "$recursiveAnchor"))?;
            }
        }

        if version >= 2020 {
            if let Some(v) = obj.get("$dynamicRef") {
                let ref_ = v.as_str().ok_or_else(|| kw_err(up, "$dynamicRef"))?;
                let uf = UrlFrag::absolute(base, ref_)?;
                let target = self.roots.resolve(&uf)?;
                let idx = self.enqueue(queue, target.clone());
                // dynamic behavior needs a matching $dynamicAnchor at the
                // statically resolved target (the bookending rule)
                let anchor = match &uf.frag {
                    Fragment::Anchor(name) => {
                        let root = self.roots.get(&target.url);
                        let res = root.resource_of(&target.ptr);
                        res.dynamic_anchors.contains(name).then(|| name.clone())
                    }
                    Fragment::JsonPointer(_) => None,
                };
                sch.dynamic_ref = Some(DynamicRef { sch: idx, anchor });
            }
        }
        Ok(())
    }

    fn compile_applicator(
        &mut self,
        sch: &mut Schema,
        obj: &Map<String, Value>,
        version: u16,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<(), CompileError> {
        sch.not = self.sub_schema(obj, "not", up, queue);
        sch.all_of = self.sub_schema_list(obj, "allOf", up, queue)?;
        sch.any_of = self.sub_schema_list(obj, "anyOf", up, queue)?;
        sch.one_of = self.sub_schema_list(obj, "oneOf", up, queue)?;

        if version >= 7 {
            sch.if_ = self.sub_schema(obj, "if", up, queue);
            if sch.if_.is_some() {
                sch.then = self.sub_schema(obj, "then", up, queue);
                sch.else_ = self.sub_schema(obj, "else", up, queue);
            }
        }

        sch.properties = self.sub_schema_map(obj, "properties", up, queue)?;
        if let Some(v) = obj.get("patternProperties") {
            let map = v
                .as_object()
                .ok_or_else(|| kw_err(up, "patternProperties"))?;
            for (pattern, _) in map {
                let re = (self.regexp_engine)(pattern).map_err(|src| {
                    CompileError::InvalidRegex {
                        url: up.to_string(),
                        regex: pattern.clone(),
                        src,
                    }
                })?;
                let idx = self.enqueue_at(up, &["patternProperties", pattern], queue);
                sch.pattern_properties.push((re, idx));
            }
        }
        sch.additional_properties =
            self.additional(obj, "additionalProperties", up, queue)?;

        if version >= 6 {
            sch.property_names = self.sub_schema(obj, "propertyNames", up, queue);
            sch.contains = self.sub_schema(obj, "contains", up, queue);
        }

        if version < 2019 {
            if let Some(v) = obj.get("dependencies") {
                let map = v.as_object().ok_or_else(|| kw_err(up, "dependencies"))?;
                for (prop, dep) in map {
                    let dep = match dep {
                        Value::Array(_) => {
                            Dependency::Props(str_list(dep, up, "dependencies")?)
                        }
                        Value::Object(_) | Value::Bool(_) => Dependency::Schema(
                            self.enqueue_at(up, &["dependencies", prop], queue),
                        ),
                        _ => return Err(kw_err(up, "dependencies")),
                    };
                    sch.dependencies.insert(prop.clone(), dep);
                }
            }
        } else {
            sch.dependent_schemas =
                self.sub_schema_map(obj, "dependentSchemas", up, queue)?;
        }

        if version < 2020 {
            match obj.get("items") {
                None => {}
                Some(Value::Array(arr)) => {
                    let mut list = Vec::with_capacity(arr.len());
                    for i in 0..arr.len() {
                        list.push(self.enqueue_at(up, &["items", &i.to_string()], queue));
                    }
                    sch.items = Some(Items::Array(list));
                    sch.additional_items =
                        self.additional(obj, "additionalItems", up, queue)?;
                }
                Some(Value::Object(_)) | Some(Value::Bool(_)) => {
                    sch.items = Some(Items::Schema(self.enqueue_at(up, &["items"], queue)));
                }
                Some(_) => return Err(kw_err(up, "items")),
            }
        } else {
            if let Some(v) = obj.get("prefixItems") {
                let arr = v.as_array().ok_or_else(|| kw_err(up, "prefixItems"))?;
                for i in 0..arr.len() {
                    sch.prefix_items
                        .push(self.enqueue_at(up, &["prefixItems", &i.to_string()], queue));
                }
            }
            match obj.get("items") {
                None => {}
                Some(Value::Object(_)) | Some(Value::Bool(_)) => {
                    sch.items2020 = Some(self.enqueue_at(up, &["items"], queue));
                }
                Some(_) => return Err(kw_err(up, "items")),
            }
        }
        Ok(())
    }

    fn compile_validation(
        &mut self,
        sch: &mut Schema,
        obj: &Map<String, Value>,
        version: u16,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<(), CompileError> {
        if let Some(v) = obj.get("type") {
            let mut types = Types::default();
            let mut add = |t: &Value| -> Result<(), CompileError> {
                let name = t.as_str().ok_or_else(|| kw_err(up, "type"))?;
                let t = Type::from_keyword(name).ok_or_else(|| kw_err(up, "type"))?;
                types.add(t);
                Ok(())
            };
            match v {
                Value::String(_) => add(v)?,
                Value::Array(arr) => {
                    for t in arr {
                        add(t)?;
                    }
                }
                _ => return Err(kw_err(up, "type")),
            }
            sch.types = types;
        }

        if let Some(v) = obj.get("enum") {
            let arr = v.as_array().ok_or_else(|| kw_err(up, "enum"))?;
            sch.enum_ = Some(arr.clone());
        }
        if version >= 6 {
            sch.const_ = obj.get("const").cloned();
        }

        if let Some(n) = num_kw(obj, "multipleOf", up)? {
            if n.as_f64().is_some_and(|f| f <= 0.0) {
                return Err(kw_err(up, "multipleOf"));
            }
            sch.multiple_of = Some(n);
        }
        sch.maximum = num_kw(obj, "maximum", up)?;
        sch.minimum = num_kw(obj, "minimum", up)?;
        if version == 4 {
            // boolean exclusiveMaximum/Minimum qualify the plain bounds
            if bool_kw(obj, "exclusiveMaximum", up)?.unwrap_or(false) {
                sch.exclusive_maximum = sch.maximum.take();
            }
            if bool_kw(obj, "exclusiveMinimum", up)?.unwrap_or(false) {
                sch.exclusive_minimum = sch.minimum.take();
            }
        } else {
            sch.exclusive_maximum = num_kw(obj, "exclusiveMaximum", up)?;
            sch.exclusive_minimum = num_kw(obj, "exclusiveMinimum", up)?;
        }

        sch.max_length = usize_kw(obj, "maxLength", up)?;
        sch.min_length = usize_kw(obj, "minLength", up)?;
        if let Some(v) = obj.get("pattern") {
            let pattern = v.as_str().ok_or_else(|| kw_err(up, "pattern"))?;
            let re = (self.regexp_engine)(pattern).map_err(|src| CompileError::InvalidRegex {
                url: up.to_string(),
                regex: pattern.to_string(),
                src,
            })?;
            sch.pattern = Some(re);
        }

        sch.max_items = usize_kw(obj, "maxItems", up)?;
        sch.min_items = usize_kw(obj, "minItems", up)?;
        sch.unique_items = bool_kw(obj, "uniqueItems", up)?.unwrap_or(false);
        if version >= 2019 {
            sch.max_contains = usize_kw(obj, "maxContains", up)?;
            sch.min_contains = usize_kw(obj, "minContains", up)?;
        }

        sch.max_properties = usize_kw(obj, "maxProperties", up)?;
        sch.min_properties = usize_kw(obj, "minProperties", up)?;
        if let Some(v) = obj.get("required") {
            sch.required = str_list(v, up, "required")?;
        }
        if version >= 2019 {
            if let Some(v) = obj.get("dependentRequired") {
                let map = v
                    .as_object()
                    .ok_or_else(|| kw_err(up, "dependentRequired"))?;
                for (prop, reqs) in map {
                    sch.dependent_required
                        .insert(prop.clone(), str_list(reqs, up, "dependentRequired")?);
                }
            }
        }
        Ok(())
    }

    fn compile_content(
        &mut self,
        sch: &mut Schema,
        obj: &Map<String, Value>,
        version: u16,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<(), CompileError> {
        if let Some(v) = obj.get("contentEncoding") {
            let name = v.as_str().ok_or_else(|| kw_err(up, "contentEncoding"))?;
            sch.content_encoding = self.decoders.get(name).cloned();
        }
        if let Some(v) = obj.get("contentMediaType") {
            let name = v
                .as_str()
                .ok_or_else(|| kw_err(up, "contentMediaType"))?;
            sch.content_media_type = self.media_types.get(name).cloned();
        }
        if version >= 2019
            && sch
                .content_media_type
                .as_ref()
                .is_some_and(|mt| mt.unmarshal.is_some())
        {
            sch.content_schema = self.sub_schema(obj, "contentSchema", up, queue);
        }
        Ok(())
    }

    fn schema_ref(
        &mut self,
        ref_: &str,
        base: &Url,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<SchemaIndex, CompileError> {
        let uf = UrlFrag::absolute(base, ref_)?;
        let up = self.roots.resolve(&uf)?;
        Ok(self.enqueue(queue, up))
    }

    fn enqueue_at(
        &mut self,
        up: &UrlPtr,
        path: &[&str],
        queue: &mut VecDeque<UrlPtr>,
    ) -> SchemaIndex {
        let mut ptr = up.ptr.clone();
        for tok in path {
            ptr = ptr.append(tok);
        }
        self.enqueue(
            queue,
            UrlPtr {
                url: up.url.clone(),
                ptr,
            },
        )
    }

    fn sub_schema(
        &mut self,
        obj: &Map<String, Value>,
        kw: &str,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Option<SchemaIndex> {
        obj.get(kw).map(|_| self.enqueue_at(up, &[kw], queue))
    }

    fn sub_schema_list(
        &mut self,
        obj: &Map<String, Value>,
        kw: &'static str,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<Vec<SchemaIndex>, CompileError> {
        let Some(v) = obj.get(kw) else {
            return Ok(Vec::new());
        };
        let arr = v.as_array().ok_or_else(|| kw_err(up, kw))?;
        Ok((0..arr.len())
            .map(|i| self.enqueue_at(up, &[kw, &i.to_string()], queue))
            .collect())
    }

    fn sub_schema_map(
        &mut self,
        obj: &Map<String, Value>,
        kw: &'static str,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<std::collections::BTreeMap<String, SchemaIndex>, CompileError> {
        let Some(v) = obj.get(kw) else {
            return Ok(Default::default());
        };
        let map = v.as_object().ok_or_else(|| kw_err(up, kw))?;
        Ok(map
            .keys()
            .map(|name| (name.clone(), self.enqueue_at(up, &[kw, name], queue)))
            .collect())
    }

    fn additional(
        &mut self,
        obj: &Map<String, Value>,
        kw: &'static str,
        up: &UrlPtr,
        queue: &mut VecDeque<UrlPtr>,
    ) -> Result<Option<Additional>, CompileError> {
        match obj.get(kw) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(Additional::Bool(*b))),
            Some(Value::Object(_)) => {
                Ok(Some(Additional::Schema(self.enqueue_at(up, &[kw], queue))))
            }
            Some(_) => Err(kw_err(up, kw)),
        }
    }
}

fn kw_err(up: &UrlPtr, keyword: &'static str) -> CompileError {
    CompileError::InvalidKeywordValue {
        url: up.to_string(),
        keyword,
    }
}

fn to_usize(n: &Number) -> Option<usize> {
    if let Some(u) = n.as_u64() {
        return usize::try_from(u).ok();
    }
    match n.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => Some(f as usize),
        _ => None,
    }
}

fn usize_kw(
    obj: &Map<String, Value>,
    kw: &'static str,
    up: &UrlPtr,
) -> Result<Option<usize>, CompileError> {
    match obj.get(kw) {
        None => Ok(None),
        Some(Value::Number(n)) => to_usize(n).map(Some).ok_or_else(|| kw_err(up, kw)),
        Some(_) => Err(kw_err(up, kw)),
    }
}

fn num_kw(
    obj: &Map<String, Value>,
    kw: &'static str,
    up: &UrlPtr,
) -> Result<Option<Number>, CompileError> {
    match obj.get(kw) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(_) => Err(kw_err(up, kw)),
    }
}

fn bool_kw(
    obj: &Map<String, Value>,
    kw: &'static str,
    up: &UrlPtr,
) -> Result<Option<bool>, CompileError> {
    match obj.get(kw) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(kw_err(up, kw)),
    }
}

fn str_list(v: &Value, up: &UrlPtr, kw: &'static str) -> Result<Vec<String>, CompileError> {
    let arr = v.as_array().ok_or_else(|| kw_err(up, kw))?;
    arr.iter()
        .map(|s| {
            s.as_str()
                .map(str::to_string)
                .ok_or_else(|| kw_err(up, kw))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(doc: Value) -> Result<(Compiler, SchemaIndex), CompileError> {
        let mut c = Compiler::new();
        c.add_resource("http://test.example/schema.json", doc)?;
        let idx = c.compile("http://test.example/schema.json")?;
        Ok((c, idx))
    }

    #[test]
    fn boolean_schemas_short_circuit() {
        let (c, idx) = compile(json!(true)).unwrap();
        assert!(c.schemas().is_valid(&json!({"anything": 1}), idx));

        let (c, idx) = compile(json!(false)).unwrap();
        assert!(!c.schemas().is_valid(&json!(null), idx));
    }

    #[test]
    fn cyclic_refs_compile() {
        let (c, idx) = compile(json!({
            "properties": {
                "child": { "$ref": "#" }
            }
        }))
        .unwrap();
        let v = json!({"child": {"child": {}}});
        assert!(c.schemas().is_valid(&v, idx));
    }

    #[test]
    fn invalid_keyword_value_fails() {
        let err = compile(json!({"minLength": "three"})).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidKeywordValue { keyword: "minLength", .. }
        ));

        let err = compile(json!({"$ref": 17})).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidKeywordValue { keyword: "$ref", .. }
        ));
    }

    #[test]
    fn invalid_regex_fails() {
        let err = compile(json!({"pattern": "["})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidRegex { .. }));
    }

    #[test]
    fn multiple_of_must_be_positive() {
        let err = compile(json!({"multipleOf": 0})).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidKeywordValue { keyword: "multipleOf", .. }
        ));
    }

    #[test]
    fn failed_compile_leaves_no_partial_schema() {
        let mut c = Compiler::new();
        c.add_resource("http://test.example/bad.json", json!({"pattern": "["}))
            .unwrap();
        let before = c.schemas.len();
        assert!(c.compile("http://test.example/bad.json").is_err());
        assert_eq!(c.schemas.len(), before);
    }

    #[test]
    fn unresolvable_ref_fails() {
        let err = compile(json!({"$ref": "#/nope"})).unwrap_err();
        assert!(matches!(err, CompileError::JsonPointerNotFound { .. }));
    }

    #[test]
    fn add_resource_rejects_fragments() {
        let mut c = Compiler::new();
        let err = c
            .add_resource("http://test.example/s.json#/defs", json!({}))
            .unwrap_err();
        assert!(matches!(err, CompileError::ParseUrlError { .. }));
    }

    #[test]
    fn compiling_twice_reuses_the_slot() {
        let mut c = Compiler::new();
        c.add_resource("http://test.example/s.json", json!({"type": "string"}))
            .unwrap();
        let a = c.compile("http://test.example/s.json").unwrap();
        let b = c.compile("http://test.example/s.json").unwrap();
        assert_eq!(a, b);
    }
}
