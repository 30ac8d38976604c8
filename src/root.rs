//! The resource graph: indexed schema documents.
//!
//! A loaded document is walked once per the draft's subschema table. Every
//! `$id` opens a resource with its own base URI; anchors are recorded per
//! resource. The index is what `$ref` resolution runs against.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::{Map, Value};
use url::Url;

use crate::draft::{subschema_locations, Dialect, Draft};
use crate::error::CompileError;
use crate::loader::DefaultUrlLoader;
use crate::uri::{split_ref, valid_anchor, Fragment, JsonPointer, UrlFrag, UrlPtr};

/// One `$id`-rooted scope inside a document.
#[derive(Debug)]
pub(crate) struct Resource {
    pub(crate) ptr: JsonPointer,
    /// Base URI; all refs inside this resource resolve against it.
    pub(crate) id: Url,
    /// anchor name -> document-absolute pointer.
    pub(crate) anchors: BTreeMap<String, JsonPointer>,
    /// Names declared with `$dynamicAnchor`.
    pub(crate) dynamic_anchors: BTreeSet<String>,
    /// Dialect override from a `$schema` at this resource root (2019+).
    pub(crate) dialect: Option<Dialect>,
}

/// An indexed document.
pub(crate) struct Root {
    pub(crate) url: Url,
    pub(crate) doc: Value,
    pub(crate) dialect: Dialect,
    pub(crate) resources: BTreeMap<JsonPointer, Resource>,
}

impl Root {
    /// The resource a location belongs to: the deepest resource whose
    /// pointer is a prefix of `ptr`.
    pub(crate) fn resource_of(&self, ptr: &JsonPointer) -> &Resource {
        self.resources
            .iter()
            .rev()
            .filter(|(res_ptr, _)| ptr.starts_with(res_ptr))
            .max_by_key(|(res_ptr, _)| res_ptr.len())
            .map(|(_, res)| res)
            .expect("document root is always a resource")
    }

    pub(crate) fn dialect_of(&self, ptr: &JsonPointer) -> &Dialect {
        self.resource_of(ptr).dialect.as_ref().unwrap_or(&self.dialect)
    }

    /// Resolve a fragment against the resource rooted at `res_ptr`.
    fn resolve_fragment(
        &self,
        frag: &Fragment,
        res_ptr: &JsonPointer,
    ) -> Result<JsonPointer, CompileError> {
        match frag {
            Fragment::JsonPointer(ptr) => Ok(res_ptr.concat(ptr)),
            Fragment::Anchor(name) => {
                let res = self
                    .resources
                    .get(res_ptr)
                    .expect("aliases always target a resource");
                res.anchors.get(name).cloned().ok_or_else(|| {
                    CompileError::AnchorNotFound {
                        url: self.url.to_string(),
                        anchor: name.clone(),
                    }
                })
            }
        }
    }
}

/// All loaded roots, plus the loader that feeds them.
pub(crate) struct Roots {
    pub(crate) loader: DefaultUrlLoader,
    pub(crate) default_draft: Draft,
    pub(crate) assert_vocabs: bool,
    map: HashMap<Url, Root>,
    /// Embedded resource id -> (document url, resource pointer).
    aliases: HashMap<Url, (Url, JsonPointer)>,
}

impl Roots {
    pub(crate) fn new() -> Self {
        Self {
            loader: DefaultUrlLoader::new(),
            default_draft: Draft::latest(),
            assert_vocabs: false,
            map: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, url: &Url) -> &Root {
        &self.map[url]
    }

    /// Resolve a url+fragment into a concrete schema location, loading and
    /// indexing the document on first sight.
    pub(crate) fn resolve(&mut self, uf: &UrlFrag) -> Result<UrlPtr, CompileError> {
        self.ensure(&uf.url)?;
        let (doc_url, res_ptr) = match self.aliases.get(&uf.url) {
            Some((doc_url, res_ptr)) => (doc_url.clone(), res_ptr.clone()),
            None => (uf.url.clone(), JsonPointer::new()),
        };
        let root = &self.map[&doc_url];
        let ptr = root.resolve_fragment(&uf.frag, &res_ptr)?;
        let up = UrlPtr { url: doc_url, ptr };
        // the pointer must land on an existing value
        up.lookup(&root.doc)?;
        Ok(up)
    }

    fn ensure(&mut self, url: &Url) -> Result<(), CompileError> {
        if self.map.contains_key(url) || self.aliases.contains_key(url) {
            return Ok(());
        }
        let doc = self.loader.load(url)?.clone();
        self.add_root(url.clone(), doc)
    }

    fn add_root(&mut self, url: Url, doc: Value) -> Result<(), CompileError> {
        let dialect = match get_schema_kw(&doc, &url)? {
            Some(schema_url) => self.dialect_for(&schema_url)?,
            None => Dialect::new(self.default_draft),
        };
        let draft = dialect.draft;

        if self.assert_vocabs {
            draft.validate_schema(url.as_str(), &doc)?;
        }

        let mut resources = BTreeMap::new();
        collect_resources(&doc, draft, &url, JsonPointer::new(), JsonPointer::new(), &mut resources, &url)?;

        // resource-root dialect overrides
        if draft.version() >= 2019 {
            let overrides: Vec<(JsonPointer, String)> = resources
                .iter()
                .filter(|(res_ptr, _)| !res_ptr.is_empty())
                .filter_map(|(res_ptr, _)| {
                    let obj = res_ptr.lookup(&doc)?.as_object()?;
                    let schema_url = obj.get("$schema")?.as_str()?;
                    Some((res_ptr.clone(), schema_url.to_string()))
                })
                .collect();
            for (res_ptr, schema_url) in overrides {
                let dialect = self.dialect_for(&schema_url)?;
                if let Some(res) = resources.get_mut(&res_ptr) {
                    res.dialect = Some(dialect);
                }
            }
        }

        // register embedded ids so refs can address them directly
        for (res_ptr, res) in &resources {
            if res.id == url {
                continue;
            }
            let target = (url.clone(), res_ptr.clone());
            if let Some(existing) = self.aliases.get(&res.id) {
                if *existing != target {
                    return Err(CompileError::DuplicateId {
                        url: url.to_string(),
                        id: res.id.to_string(),
                        ptr1: existing.1.to_string(),
                        ptr2: res_ptr.to_string(),
                    });
                }
            }
            self.aliases.insert(res.id.clone(), target);
        }

        self.map.insert(
            url.clone(),
            Root {
                url,
                doc,
                dialect,
                resources,
            },
        );
        Ok(())
    }

    /// The dialect a `$schema` URL names: an official draft, or a loaded
    /// meta-schema document with a `$vocabulary` declaration.
    fn dialect_for(&mut self, schema_url: &str) -> Result<Dialect, CompileError> {
        if let Some(draft) = Draft::from_url(schema_url) {
            return Ok(Dialect::new(draft));
        }
        let (base, frag) = split_ref(schema_url);
        if !frag.is_empty() {
            return Err(CompileError::UnsupportedDraft {
                url: schema_url.to_string(),
            });
        }
        let meta_url = Url::parse(base).map_err(|_| CompileError::ParseUrlError {
            url: schema_url.to_string(),
        })?;
        let meta_doc = self.loader.load(&meta_url)?.clone();
        let draft = meta_doc
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Draft::from_url)
            .ok_or_else(|| CompileError::UnsupportedDraft {
                url: schema_url.to_string(),
            })?;
        let vocabs = draft.get_vocabs(schema_url, &meta_doc)?;
        Ok(Dialect { draft, vocabs })
    }
}

fn get_schema_kw(doc: &Value, url: &Url) -> Result<Option<String>, CompileError> {
    let Some(v) = doc.as_object().and_then(|obj| obj.get("$schema")) else {
        return Ok(None);
    };
    match v.as_str() {
        Some(s) => Ok(Some(s.to_string())),
        None => Err(CompileError::InvalidKeywordValue {
            url: url.to_string(),
            keyword: "$schema",
        }),
    }
}

/// Walk one subschema, creating resources and recording anchors.
fn collect_resources(
    v: &Value,
    draft: Draft,
    base: &Url,
    ptr: JsonPointer,
    res_ptr: JsonPointer,
    resources: &mut BTreeMap<JsonPointer, Resource>,
    doc_url: &Url,
) -> Result<(), CompileError> {
    let Value::Object(obj) = v else {
        if ptr.is_empty() {
            // boolean root schema still forms a resource
            resources.insert(
                JsonPointer::new(),
                Resource {
                    ptr: JsonPointer::new(),
                    id: base.clone(),
                    anchors: BTreeMap::new(),
                    dynamic_anchors: BTreeSet::new(),
                    dialect: None,
                },
            );
        }
        return Ok(());
    };

    let up = || UrlPtr {
        url: doc_url.clone(),
        ptr: ptr.clone(),
    };

    let id = match draft.get_id(obj) {
        Some(id_str) => {
            let id = base.join(id_str).map_err(|_| CompileError::ParseIdError {
                url: up().to_string(),
            })?;
            Some(id)
        }
        None => None,
    };

    let (cur_base, cur_res_ptr) = if ptr.is_empty() || id.is_some() {
        let id = id.unwrap_or_else(|| base.clone());
        if let Some((dup_ptr, _)) = resources.iter().find(|(_, res)| res.id == id) {
            return Err(CompileError::DuplicateId {
                url: doc_url.to_string(),
                id: id.to_string(),
                ptr1: dup_ptr.to_string(),
                ptr2: ptr.to_string(),
            });
        }
        resources.insert(
            ptr.clone(),
            Resource {
                ptr: ptr.clone(),
                id: id.clone(),
                anchors: BTreeMap::new(),
                dynamic_anchors: BTreeSet::new(),
                dialect: None,
            },
        );
        (id, ptr.clone())
    } else {
        let res = resources
            .get(&res_ptr)
            .expect("enclosing resource exists before its children");
        (res.id.clone(), res_ptr.clone())
    };

    collect_anchors(obj, draft, &ptr, &cur_res_ptr, resources, doc_url)?;

    for (child_ptr, child) in subschema_locations(draft, obj, &ptr) {
        collect_resources(
            child,
            draft,
            &cur_base,
            child_ptr,
            cur_res_ptr.clone(),
            resources,
            doc_url,
        )?;
    }
    Ok(())
}

fn collect_anchors(
    obj: &Map<String, Value>,
    draft: Draft,
    ptr: &JsonPointer,
    res_ptr: &JsonPointer,
    resources: &mut BTreeMap<JsonPointer, Resource>,
    doc_url: &Url,
) -> Result<(), CompileError> {
    let version = draft.version();
    if version < 2019 {
        if obj.contains_key("$ref") {
            return Ok(()); // anchors are siblings of $ref, so ignored
        }
        // fragment-only ids act as anchors: {"$id": "#foo"}
        if let Some(id_str) = obj.get(draft.id_keyword()).and_then(Value::as_str) {
            let (_, frag) = split_ref(id_str);
            if !frag.is_empty() {
                add_anchor(frag, false, draft, ptr, res_ptr, resources, doc_url)?;
            }
        }
        return Ok(());
    }

    if let Some(v) = obj.get("$anchor") {
        let name = v.as_str().ok_or_else(|| CompileError::ParseAnchorError {
            url: anchor_loc(doc_url, ptr),
        })?;
        add_anchor(name, false, draft, ptr, res_ptr, resources, doc_url)?;
    }
    if version >= 2020 {
        if let Some(v) = obj.get("$dynamicAnchor") {
            let name = v.as_str().ok_or_else(|| CompileError::ParseAnchorError {
                url: anchor_loc(doc_url, ptr),
            })?;
            add_anchor(name, true, draft, ptr, res_ptr, resources, doc_url)?;
        }
    }
    Ok(())
}

fn add_anchor(
    name: &str,
    dynamic: bool,
    draft: Draft,
    ptr: &JsonPointer,
    res_ptr: &JsonPointer,
    resources: &mut BTreeMap<JsonPointer, Resource>,
    doc_url: &Url,
) -> Result<(), CompileError> {
    if !valid_anchor(name, draft.version()) {
        return Err(CompileError::ParseAnchorError {
            url: anchor_loc(doc_url, ptr),
        });
    }
    let res = resources
        .get_mut(res_ptr)
        .expect("enclosing resource exists before its children");
    if let Some(existing) = res.anchors.get(name) {
        if *existing != *ptr {
            return Err(CompileError::DuplicateAnchor {
                url: doc_url.to_string(),
                anchor: name.to_string(),
                ptr1: existing.to_string(),
                ptr2: ptr.to_string(),
            });
        }
    }
    res.anchors.insert(name.to_string(), ptr.clone());
    if dynamic {
        res.dynamic_anchors.insert(name.to_string());
    }
    Ok(())
}

fn anchor_loc(doc_url: &Url, ptr: &JsonPointer) -> String {
    format!("{doc_url}#{ptr}")
}
