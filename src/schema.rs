//! Compiled schemas.
//!
//! Compilation produces one [`Schema`] per `(document, pointer)` location,
//! stored in an arena owned by the compiler. Cross-schema references are
//! stable indices into that arena, which is what lets cyclic schemas
//! compile without recursion.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Number, Value};

use crate::compiler::Regexp;
use crate::content::{Decoder, MediaType};
use crate::format::Format;
use crate::output::ValidationError;
use crate::uri::UrlPtr;
use crate::validator;
use crate::value::Types;

/// Stable handle to a compiled schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaIndex(pub(crate) usize);

/// `additionalProperties` / `additionalItems`: a boolean or a subschema.
#[derive(Debug)]
pub(crate) enum Additional {
    Bool(bool),
    Schema(SchemaIndex),
}

/// Pre-2020 `items`: a single schema applied to all items, or one per index.
#[derive(Debug)]
pub(crate) enum Items {
    Schema(SchemaIndex),
    Array(Vec<SchemaIndex>),
}

/// Pre-2019 `dependencies` entry.
#[derive(Debug)]
pub(crate) enum Dependency {
    Props(Vec<String>),
    Schema(SchemaIndex),
}

/// Compiled `$dynamicRef`. `anchor` is set only when the statically
/// resolved target declares a matching `$dynamicAnchor` (the bookending
/// requirement); otherwise the reference behaves like `$ref`.
#[derive(Debug)]
pub(crate) struct DynamicRef {
    pub(crate) sch: SchemaIndex,
    pub(crate) anchor: Option<String>,
}

/// One compiled schema node. Immutable once the compile call that created
/// it returns.
pub(crate) struct Schema {
    pub(crate) up: UrlPtr,
    pub(crate) draft_version: u16,
    /// Schema at the root of the enclosing resource.
    pub(crate) resource: SchemaIndex,
    /// On resource roots: `$dynamicAnchor` name -> target schema.
    pub(crate) dynamic_anchors: BTreeMap<String, SchemaIndex>,

    /// Set for boolean schemas; short-circuits everything else.
    pub(crate) boolean: Option<bool>,

    // core
    pub(crate) ref_: Option<SchemaIndex>,
    pub(crate) recursive_ref: Option<SchemaIndex>,
    pub(crate) recursive_anchor: bool,
    pub(crate) dynamic_ref: Option<DynamicRef>,

    // validation, any type
    pub(crate) types: Types,
    pub(crate) enum_: Option<Vec<Value>>,
    pub(crate) const_: Option<Value>,
    pub(crate) format: Option<Format>,

    // validation, numbers
    pub(crate) multiple_of: Option<Number>,
    pub(crate) maximum: Option<Number>,
    pub(crate) minimum: Option<Number>,
    pub(crate) exclusive_maximum: Option<Number>,
    pub(crate) exclusive_minimum: Option<Number>,

    // validation, strings
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) pattern: Option<Box<dyn Regexp>>,
    pub(crate) content_encoding: Option<Decoder>,
    pub(crate) content_media_type: Option<MediaType>,
    pub(crate) content_schema: Option<SchemaIndex>,

    // validation + applicators, objects
    pub(crate) min_properties: Option<usize>,
    pub(crate) max_properties: Option<usize>,
    pub(crate) required: Vec<String>,
    pub(crate) properties: BTreeMap<String, SchemaIndex>,
    pub(crate) pattern_properties: Vec<(Box<dyn Regexp>, SchemaIndex)>,
    pub(crate) additional_properties: Option<Additional>,
    pub(crate) property_names: Option<SchemaIndex>,
    pub(crate) dependencies: BTreeMap<String, Dependency>,
    pub(crate) dependent_required: BTreeMap<String, Vec<String>>,
    pub(crate) dependent_schemas: BTreeMap<String, SchemaIndex>,

    // validation + applicators, arrays
    pub(crate) min_items: Option<usize>,
    pub(crate) max_items: Option<usize>,
    pub(crate) unique_items: bool,
    pub(crate) items: Option<Items>,
    pub(crate) additional_items: Option<Additional>,
    pub(crate) prefix_items: Vec<SchemaIndex>,
    pub(crate) items2020: Option<SchemaIndex>,
    pub(crate) contains: Option<SchemaIndex>,
    pub(crate) min_contains: Option<usize>,
    pub(crate) max_contains: Option<usize>,

    // in-place applicators
    pub(crate) not: Option<SchemaIndex>,
    pub(crate) all_of: Vec<SchemaIndex>,
    pub(crate) any_of: Vec<SchemaIndex>,
    pub(crate) one_of: Vec<SchemaIndex>,
    pub(crate) if_: Option<SchemaIndex>,
    pub(crate) then: Option<SchemaIndex>,
    pub(crate) else_: Option<SchemaIndex>,

    // unevaluated
    pub(crate) unevaluated_properties: Option<SchemaIndex>,
    pub(crate) unevaluated_items: Option<SchemaIndex>,
}

impl Schema {
    pub(crate) fn placeholder(up: UrlPtr, idx: SchemaIndex) -> Self {
        Schema {
            up,
            draft_version: 0,
            resource: idx,
            dynamic_anchors: BTreeMap::new(),
            boolean: None,
            ref_: None,
            recursive_ref: None,
            recursive_anchor: false,
            dynamic_ref: None,
            types: Types::default(),
            enum_: None,
            const_: None,
            format: None,
            multiple_of: None,
            maximum: None,
            minimum: None,
            exclusive_maximum: None,
            exclusive_minimum: None,
            min_length: None,
            max_length: None,
            pattern: None,
            content_encoding: None,
            content_media_type: None,
            content_schema: None,
            min_properties: None,
            max_properties: None,
            required: Vec::new(),
            properties: BTreeMap::new(),
            pattern_properties: Vec::new(),
            additional_properties: None,
            property_names: None,
            dependencies: BTreeMap::new(),
            dependent_required: BTreeMap::new(),
            dependent_schemas: BTreeMap::new(),
            min_items: None,
            max_items: None,
            unique_items: false,
            items: None,
            additional_items: None,
            prefix_items: Vec::new(),
            items2020: None,
            contains: None,
            min_contains: None,
            max_contains: None,
            not: None,
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            if_: None,
            then: None,
            else_: None,
            unevaluated_properties: None,
            unevaluated_items: None,
        }
    }
}

/// The arena of compiled schemas.
///
/// Immutable through the public API; freely shareable across threads once
/// compilation is done.
#[derive(Default)]
pub struct Schemas {
    list: Vec<Schema>,
    map: HashMap<UrlPtr, SchemaIndex>,
}

impl Schemas {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn index_of(&self, up: &UrlPtr) -> Option<SchemaIndex> {
        self.map.get(up).copied()
    }

    pub(crate) fn insert_placeholder(&mut self, up: UrlPtr) -> SchemaIndex {
        let idx = SchemaIndex(self.list.len());
        self.list.push(Schema::placeholder(up.clone(), idx));
        self.map.insert(up, idx);
        idx
    }

    pub(crate) fn get(&self, idx: SchemaIndex) -> &Schema {
        &self.list[idx.0]
    }

    pub(crate) fn set(&mut self, idx: SchemaIndex, sch: Schema) {
        self.list[idx.0] = sch;
    }

    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }

    /// Drop every schema allocated at or past `len`. Used to unwind a
    /// failed compile so no partial schema survives.
    pub(crate) fn rollback(&mut self, len: usize) {
        self.list.truncate(len);
        self.map.retain(|_, idx| idx.0 < len);
    }

    /// Validate an instance, collecting every error in document order.
    ///
    /// # Errors
    ///
    /// Returns the structured error tree when the instance is invalid.
    pub fn validate(&self, v: &Value, sch: SchemaIndex) -> Result<(), ValidationError> {
        validator::validate(self, sch, v, false)
    }

    /// Boolean validity check that stops at the first failure.
    #[must_use]
    pub fn is_valid(&self, v: &Value, sch: SchemaIndex) -> bool {
        validator::validate(self, sch, v, true).is_ok()
    }
}
