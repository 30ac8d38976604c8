//! Schema evaluation.
//!
//! Recursive descent over the instance. Keywords run in a fixed order:
//! structural assertions first, then in-place applicators, then child
//! applicators, with `unevaluatedProperties`/`unevaluatedItems` last so
//! they see every annotation their siblings produced. Each evaluation call
//! builds a fresh result; the compiled schema is never touched.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde_json::Value;

use crate::output::{ErrorKind, ValidationError};
use crate::schema::{Additional, Dependency, Items, Schema, SchemaIndex, Schemas};
use crate::uri::escape;
use crate::value::{equals, multiple_of, num_cmp, Type};

pub(crate) fn validate(
    schemas: &Schemas,
    sch: SchemaIndex,
    v: &Value,
    fail_fast: bool,
) -> Result<(), ValidationError> {
    let mut vd = Validator {
        schemas,
        fail_fast,
        vloc: String::new(),
        kloc: String::new(),
        scope: Vec::new(),
    };
    match vd.validate_schema(sch, v) {
        Ok(_) => Ok(()),
        Err(err) => {
            let url = schemas.get(sch).up.to_string();
            let causes = if matches!(err.kind, ErrorKind::Group) && err.keyword_location.is_empty()
            {
                err.causes
            } else {
                vec![err]
            };
            Err(ValidationError {
                keyword_location: String::new(),
                absolute_keyword_location: url.clone(),
                instance_location: String::new(),
                kind: ErrorKind::Schema { url },
                causes,
            })
        }
    }
}

/// Property names and item indices of the current instance that no keyword
/// has evaluated yet.
#[derive(Debug, Default)]
struct Uneval {
    props: BTreeSet<String>,
    items: BTreeSet<usize>,
}

impl Uneval {
    fn of(v: &Value) -> Uneval {
        match v {
            Value::Object(obj) => Uneval {
                props: obj.keys().cloned().collect(),
                items: BTreeSet::new(),
            },
            Value::Array(arr) => Uneval {
                props: BTreeSet::new(),
                items: (0..arr.len()).collect(),
            },
            _ => Uneval::default(),
        }
    }

    /// Keep only what the other evaluation also left unevaluated.
    fn intersect(&mut self, other: &Uneval) {
        self.props.retain(|p| other.props.contains(p));
        self.items.retain(|i| other.items.contains(i));
    }
}

struct Validator<'s> {
    schemas: &'s Schemas,
    fail_fast: bool,
    /// Instance location of the value under evaluation, as a JSON Pointer.
    vloc: String,
    /// Dynamic keyword location, `$ref` hops included.
    kloc: String,
    /// Evaluation stack: (schema, instance depth), outermost first.
    scope: Vec<(SchemaIndex, usize)>,
}

impl<'s> Validator<'s> {
    fn validate_schema(
        &mut self,
        idx: SchemaIndex,
        v: &Value,
    ) -> Result<Uneval, ValidationError> {
        let sch = self.schemas.get(idx);
        if let Some(b) = sch.boolean {
            return if b {
                Ok(Uneval::of(v))
            } else {
                Err(self.error(sch, "", ErrorKind::FalseSchema))
            };
        }
        let vid = self.vloc.len();
        if self.scope.iter().any(|(s, d)| *s == idx && *d == vid) {
            return Err(self.error(
                sch,
                "",
                ErrorKind::RefCycle {
                    url: sch.up.to_string(),
                },
            ));
        }
        self.scope.push((idx, vid));
        let result = self.frame(sch, v);
        self.scope.pop();
        result
    }

    fn frame(&mut self, sch: &'s Schema, v: &Value) -> Result<Uneval, ValidationError> {
        let mut uneval = Uneval::of(v);
        let mut errors = Vec::new();

        self.assertions(sch, v, &mut errors)?;
        self.references(sch, v, &mut uneval, &mut errors)?;
        self.combinators(sch, v, &mut uneval, &mut errors)?;
        match v {
            Value::Object(_) => self.object_children(sch, v, &mut uneval, &mut errors)?,
            Value::Array(_) => self.array_children(sch, v, &mut uneval, &mut errors)?,
            _ => {}
        }
        self.unevaluated(sch, v, &mut uneval, &mut errors)?;

        if errors.is_empty() {
            Ok(uneval)
        } else {
            Err(self.seal(sch, errors))
        }
    }

    /// Structural, non-applicator keywords.
    fn assertions(
        &mut self,
        sch: &'s Schema,
        v: &Value,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), ValidationError> {
        if !sch.types.is_empty() && !sch.types.matches(v) {
            let err = self.error(
                sch,
                "/type",
                ErrorKind::Type {
                    got: Type::of(v),
                    want: sch.types,
                },
            );
            self.add(errors, sch, err)?;
        }
        if let Some(want) = &sch.const_ {
            if !equals(v, want) {
                let err = self.error(sch, "/const", ErrorKind::Const { want: want.clone() });
                self.add(errors, sch, err)?;
            }
        }
        if let Some(want) = &sch.enum_ {
            if !want.iter().any(|w| equals(v, w)) {
                let err = self.error(sch, "/enum", ErrorKind::Enum { want: want.clone() });
                self.add(errors, sch, err)?;
            }
        }
        if let Some(format) = &sch.format {
            if let Err(src) = (format.func)(v) {
                let err = self.error(
                    sch,
                    "/format",
                    ErrorKind::Format {
                        format: format.name.clone(),
                        err: src.to_string(),
                    },
                );
                self.add(errors, sch, err)?;
            }
        }

        match v {
            Value::Number(n) => {
                if let Some(want) = &sch.multiple_of {
                    if !multiple_of(n, want) {
                        let err = self.error(
                            sch,
                            "/multipleOf",
                            ErrorKind::MultipleOf {
                                got: n.clone(),
                                want: want.clone(),
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                if let Some(want) = &sch.maximum {
                    if num_cmp(n, want) == Ordering::Greater {
                        let err = self.error(
                            sch,
                            "/maximum",
                            ErrorKind::Maximum {
                                got: n.clone(),
                                want: want.clone(),
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                if let Some(want) = &sch.exclusive_maximum {
                    if num_cmp(n, want) != Ordering::Less {
                        let err = self.error(
                            sch,
                            "/exclusiveMaximum",
                            ErrorKind::ExclusiveMaximum {
                                got: n.clone(),
                                want: want.clone(),
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                if let Some(want) = &sch.minimum {
                    if num_cmp(n, want) == Ordering::Less {
                        let err = self.error(
                            sch,
                            "/minimum",
                            ErrorKind::Minimum {
                                got: n.clone(),
                                want: want.clone(),
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                if let Some(want) = &sch.exclusive_minimum {
                    if num_cmp(n, want) != Ordering::Greater {
                        let err = self.error(
                            sch,
                            "/exclusiveMinimum",
                            ErrorKind::ExclusiveMinimum {
                                got: n.clone(),
                                want: want.clone(),
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
            }
            Value::String(s) => {
                if sch.min_length.is_some() || sch.max_length.is_some() {
                    let len = s.chars().count();
                    if let Some(want) = sch.max_length {
                        if len > want {
                            let err = self.error(
                                sch,
                                "/maxLength",
                                ErrorKind::MaxLength { got: len, want },
                            );
                            self.add(errors, sch, err)?;
                        }
                    }
                    if let Some(want) = sch.min_length {
                        if len < want {
                            let err = self.error(
                                sch,
                                "/minLength",
                                ErrorKind::MinLength { got: len, want },
                            );
                            self.add(errors, sch, err)?;
                        }
                    }
                }
                if let Some(re) = &sch.pattern {
                    if !re.matches(s) {
                        let err = self.error(
                            sch,
                            "/pattern",
                            ErrorKind::Pattern {
                                got: s.clone(),
                                want: re.as_str().to_string(),
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                self.content(sch, s, errors)?;
            }
            Value::Array(arr) => {
                if let Some(want) = sch.max_items {
                    if arr.len() > want {
                        let err = self.error(
                            sch,
                            "/maxItems",
                            ErrorKind::MaxItems {
                                got: arr.len(),
                                want,
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                if let Some(want) = sch.min_items {
                    if arr.len() < want {
                        let err = self.error(
                            sch,
                            "/minItems",
                            ErrorKind::MinItems {
                                got: arr.len(),
                                want,
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                if sch.unique_items {
                    'unique: for i in 1..arr.len() {
                        for j in 0..i {
                            if equals(&arr[i], &arr[j]) {
                                let err = self.error(
                                    sch,
                                    "/uniqueItems",
                                    ErrorKind::UniqueItems { got: [j, i] },
                                );
                                self.add(errors, sch, err)?;
                                break 'unique;
                            }
                        }
                    }
                }
            }
            Value::Object(obj) => {
                if let Some(want) = sch.max_properties {
                    if obj.len() > want {
                        let err = self.error(
                            sch,
                            "/maxProperties",
                            ErrorKind::MaxProperties {
                                got: obj.len(),
                                want,
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                if let Some(want) = sch.min_properties {
                    if obj.len() < want {
                        let err = self.error(
                            sch,
                            "/minProperties",
                            ErrorKind::MinProperties {
                                got: obj.len(),
                                want,
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                if !sch.required.is_empty() {
                    let missing: Vec<String> = sch
                        .required
                        .iter()
                        .filter(|p| !obj.contains_key(*p))
                        .cloned()
                        .collect();
                    if !missing.is_empty() {
                        let err =
                            self.error(sch, "/required", ErrorKind::Required { want: missing });
                        self.add(errors, sch, err)?;
                    }
                }
                for (prop, want) in &sch.dependent_required {
                    if !obj.contains_key(prop) {
                        continue;
                    }
                    let missing: Vec<String> = want
                        .iter()
                        .filter(|p| !obj.contains_key(*p))
                        .cloned()
                        .collect();
                    if !missing.is_empty() {
                        let err = self.error(
                            sch,
                            "/dependentRequired",
                            ErrorKind::DependentRequired {
                                got: prop.clone(),
                                want: missing,
                            },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn content(
        &mut self,
        sch: &'s Schema,
        s: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), ValidationError> {
        let mut bytes: Option<Vec<u8>> = None;
        if let Some(decoder) = &sch.content_encoding {
            match (decoder.func)(s) {
                Ok(decoded) => bytes = Some(decoded),
                Err(src) => {
                    let err = self.error(
                        sch,
                        "/contentEncoding",
                        ErrorKind::ContentEncoding {
                            want: decoder.name.clone(),
                            err: src.to_string(),
                        },
                    );
                    self.add(errors, sch, err)?;
                    return Ok(());
                }
            }
        }
        let Some(media_type) = &sch.content_media_type else {
            return Ok(());
        };
        let bytes = bytes.unwrap_or_else(|| s.as_bytes().to_vec());
        if let Err(src) = (media_type.func)(&bytes) {
            let err = self.error(
                sch,
                "/contentMediaType",
                ErrorKind::ContentMediaType {
                    want: media_type.name.clone(),
                    err: src.to_string(),
                },
            );
            self.add(errors, sch, err)?;
            return Ok(());
        }
        if let (Some(unmarshal), Some(content_schema)) = (media_type.unmarshal, sch.content_schema)
        {
            if let Ok(decoded) = unmarshal(&bytes) {
                let klen = self.kloc.len();
                self.kloc.push_str("/contentSchema");
                let result = self.validate_schema(content_schema, &decoded);
                self.kloc.truncate(klen);
                if let Err(cause) = result {
                    let err = self.error_with(
                        sch,
                        "/contentSchema",
                        ErrorKind::ContentSchema,
                        vec![cause],
                    );
                    self.add(errors, sch, err)?;
                }
            }
        }
        Ok(())
    }

    fn references(
        &mut self,
        sch: &'s Schema,
        v: &Value,
        uneval: &mut Uneval,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), ValidationError> {
        if let Some(target) = sch.ref_ {
            self.in_place_ref(sch, "$ref", target, v, uneval, errors)?;
        }
        if let Some(static_target) = sch.recursive_ref {
            let mut target = static_target;
            if self.schemas.get(static_target).recursive_anchor {
                // outermost dynamic scope with $recursiveAnchor wins
                for (s, _) in &self.scope {
                    let res = self.schemas.get(*s).resource;
                    if self.schemas.get(res).recursive_anchor {
                        target = res;
                        break;
                    }
                }
            }
            self.in_place_ref(sch, "$recursiveRef", target, v, uneval, errors)?;
        }
        if let Some(dynamic_ref) = &sch.dynamic_ref {
            let mut target = dynamic_ref.sch;
            if let Some(anchor) = &dynamic_ref.anchor {
                for (s, _) in &self.scope {
                    let res = self.schemas.get(*s).resource;
                    if let Some(t) = self.schemas.get(res).dynamic_anchors.get(anchor) {
                        target = *t;
                        break;
                    }
                }
            }
            self.in_place_ref(sch, "$dynamicRef", target, v, uneval, errors)?;
        }
        Ok(())
    }

    fn in_place_ref(
        &mut self,
        sch: &'s Schema,
        kw: &'static str,
        target: SchemaIndex,
        v: &Value,
        uneval: &mut Uneval,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), ValidationError> {
        let klen = self.kloc.len();
        self.kloc.push('/');
        self.kloc.push_str(kw);
        let result = self.validate_schema(target, v);
        self.kloc.truncate(klen);
        match result {
            Ok(u) => {
                uneval.intersect(&u);
                Ok(())
            }
            Err(cause) => {
                let url = self.schemas.get(target).up.to_string();
                let err = self.error_with(
                    sch,
                    &format!("/{kw}"),
                    ErrorKind::Reference { keyword: kw, url },
                    vec![cause],
                );
                self.add(errors, sch, err)
            }
        }
    }

    fn combinators(
        &mut self,
        sch: &'s Schema,
        v: &Value,
        uneval: &mut Uneval,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), ValidationError> {
        if let Some(not) = sch.not {
            let klen = self.kloc.len();
            self.kloc.push_str("/not");
            let result = self.validate_schema(not, v);
            self.kloc.truncate(klen);
            if result.is_ok() {
                let err = self.error(sch, "/not", ErrorKind::Not);
                self.add(errors, sch, err)?;
            }
        }

        if !sch.all_of.is_empty() {
            let mut branch_errors = Vec::new();
            for (i, sub) in sch.all_of.iter().enumerate() {
                match self.in_place_branch(*sub, &format!("/allOf/{i}"), v) {
                    Ok(u) => uneval.intersect(&u),
                    Err(e) => {
                        branch_errors.push(e);
                        if self.fail_fast {
                            break;
                        }
                    }
                }
            }
            if !branch_errors.is_empty() {
                let err = self.error_with(sch, "/allOf", ErrorKind::AllOf, branch_errors);
                self.add(errors, sch, err)?;
            }
        }

        if !sch.any_of.is_empty() {
            // every branch runs so annotations of every match survive
            let mut matched = false;
            let mut branch_errors = Vec::new();
            for (i, sub) in sch.any_of.iter().enumerate() {
                match self.in_place_branch(*sub, &format!("/anyOf/{i}"), v) {
                    Ok(u) => {
                        matched = true;
                        uneval.intersect(&u);
                    }
                    Err(e) => branch_errors.push(e),
                }
            }
            if !matched {
                let err = self.error_with(sch, "/anyOf", ErrorKind::AnyOf, branch_errors);
                self.add(errors, sch, err)?;
            }
        }

        if !sch.one_of.is_empty() {
            let mut matched = Vec::new();
            let mut branch_errors = Vec::new();
            for (i, sub) in sch.one_of.iter().enumerate() {
                match self.in_place_branch(*sub, &format!("/oneOf/{i}"), v) {
                    Ok(u) => {
                        matched.push(i);
                        uneval.intersect(&u);
                        if matched.len() > 1 && self.fail_fast {
                            break;
                        }
                    }
                    Err(e) => branch_errors.push(e),
                }
            }
            match matched.as_slice() {
                [_] => {}
                [] => {
                    let err = self.error_with(
                        sch,
                        "/oneOf",
                        ErrorKind::OneOf { got: None },
                        branch_errors,
                    );
                    self.add(errors, sch, err)?;
                }
                [a, b, ..] => {
                    let err = self.error(
                        sch,
                        "/oneOf",
                        ErrorKind::OneOf {
                            got: Some([*a, *b]),
                        },
                    );
                    self.add(errors, sch, err)?;
                }
            }
        }

        if let Some(if_) = sch.if_ {
            let klen = self.kloc.len();
            self.kloc.push_str("/if");
            let if_result = self.validate_schema(if_, v);
            self.kloc.truncate(klen);
            match if_result {
                Ok(u) => {
                    uneval.intersect(&u);
                    if let Some(then) = sch.then {
                        match self.in_place_branch(then, "/then", v) {
                            Ok(u) => uneval.intersect(&u),
                            Err(e) => self.add(errors, sch, e)?,
                        }
                    }
                }
                Err(_) => {
                    if let Some(else_) = sch.else_ {
                        match self.in_place_branch(else_, "/else", v) {
                            Ok(u) => uneval.intersect(&u),
                            Err(e) => self.add(errors, sch, e)?,
                        }
                    }
                }
            }
        }

        if let Value::Object(obj) = v {
            for (prop, dep) in &sch.dependencies {
                if !obj.contains_key(prop) {
                    continue;
                }
                match dep {
                    Dependency::Props(want) => {
                        let missing: Vec<String> = want
                            .iter()
                            .filter(|p| !obj.contains_key(*p))
                            .cloned()
                            .collect();
                        if !missing.is_empty() {
                            let err = self.error(
                                sch,
                                "/dependencies",
                                ErrorKind::DependentRequired {
                                    got: prop.clone(),
                                    want: missing,
                                },
                            );
                            self.add(errors, sch, err)?;
                        }
                    }
                    Dependency::Schema(sub) => {
                        let path = format!("/dependencies/{}", escape(prop));
                        match self.in_place_branch(*sub, &path, v) {
                            Ok(u) => uneval.intersect(&u),
                            Err(e) => self.add(errors, sch, e)?,
                        }
                    }
                }
            }
            for (prop, sub) in &sch.dependent_schemas {
                if !obj.contains_key(prop) {
                    continue;
                }
                let path = format!("/dependentSchemas/{}", escape(prop));
                match self.in_place_branch(*sub, &path, v) {
                    Ok(u) => uneval.intersect(&u),
                    Err(e) => self.add(errors, sch, e)?,
                }
            }
        }
        Ok(())
    }

    fn object_children(
        &mut self,
        sch: &'s Schema,
        v: &Value,
        uneval: &mut Uneval,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), ValidationError> {
        let Value::Object(obj) = v else { return Ok(()) };

        for (name, sub) in &sch.properties {
            if let Some(pv) = obj.get(name) {
                uneval.props.remove(name);
                let path = format!("/properties/{}", escape(name));
                if let Some(e) = self.validate_child(*sub, pv, &path, name) {
                    self.add(errors, sch, e)?;
                }
            }
        }

        for (re, sub) in &sch.pattern_properties {
            for (key, pv) in obj {
                if re.matches(key) {
                    uneval.props.remove(key);
                    let path = format!("/patternProperties/{}", escape(re.as_str()));
                    if let Some(e) = self.validate_child(*sub, pv, &path, key) {
                        self.add(errors, sch, e)?;
                    }
                }
            }
        }

        if let Some(additional) = &sch.additional_properties {
            let extra: Vec<&String> = obj
                .keys()
                .filter(|key| {
                    !sch.properties.contains_key(*key)
                        && !sch
                            .pattern_properties
                            .iter()
                            .any(|(re, _)| re.matches(key))
                })
                .collect();
            match additional {
                Additional::Bool(false) => {
                    if !extra.is_empty() {
                        let got = extra.iter().map(|k| (*k).clone()).collect();
                        let err = self.error(
                            sch,
                            "/additionalProperties",
                            ErrorKind::AdditionalProperties { got },
                        );
                        self.add(errors, sch, err)?;
                    }
                }
                Additional::Bool(true) => {
                    for key in extra {
                        uneval.props.remove(key);
                    }
                }
                Additional::Schema(sub) => {
                    for key in extra {
                        uneval.props.remove(key);
                        if let Some(e) =
                            self.validate_child(*sub, &obj[key], "/additionalProperties", key)
                        {
                            self.add(errors, sch, e)?;
                        }
                    }
                }
            }
        }

        if let Some(sub) = sch.property_names {
            for key in obj.keys() {
                let name = Value::String(key.clone());
                let klen = self.kloc.len();
                self.kloc.push_str("/propertyNames");
                let result = self.validate_schema(sub, &name);
                self.kloc.truncate(klen);
                if let Err(cause) = result {
                    let err = self.error_with(
                        sch,
                        "/propertyNames",
                        ErrorKind::PropertyName { prop: key.clone() },
                        vec![cause],
                    );
                    self.add(errors, sch, err)?;
                }
            }
        }
        Ok(())
    }

    fn array_children(
        &mut self,
        sch: &'s Schema,
        v: &Value,
        uneval: &mut Uneval,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), ValidationError> {
        let Value::Array(arr) = v else { return Ok(()) };

        if sch.draft_version < 2020 {
            match &sch.items {
                Some(Items::Schema(sub)) => {
                    for (i, item) in arr.iter().enumerate() {
                        uneval.items.remove(&i);
                        if let Some(e) =
                            self.validate_child(*sub, item, "/items", &i.to_string())
                        {
                            self.add(errors, sch, e)?;
                        }
                    }
                }
                Some(Items::Array(list)) => {
                    for (i, (sub, item)) in list.iter().zip(arr).enumerate() {
                        uneval.items.remove(&i);
                        let path = format!("/items/{i}");
                        if let Some(e) = self.validate_child(*sub, item, &path, &i.to_string()) {
                            self.add(errors, sch, e)?;
                        }
                    }
                    if arr.len() > list.len() {
                        match &sch.additional_items {
                            Some(Additional::Bool(false)) => {
                                let err = self.error(
                                    sch,
                                    "/additionalItems",
                                    ErrorKind::AdditionalItems { got: list.len() },
                                );
                                self.add(errors, sch, err)?;
                            }
                            Some(Additional::Bool(true)) => {
                                for i in list.len()..arr.len() {
                                    uneval.items.remove(&i);
                                }
                            }
                            Some(Additional::Schema(sub)) => {
                                for (i, item) in arr.iter().enumerate().skip(list.len()) {
                                    uneval.items.remove(&i);
                                    if let Some(e) = self.validate_child(
                                        *sub,
                                        item,
                                        "/additionalItems",
                                        &i.to_string(),
                                    ) {
                                        self.add(errors, sch, e)?;
                                    }
                                }
                            }
                            None => {}
                        }
                    }
                }
                None => {}
            }
        } else {
            for (i, (sub, item)) in sch.prefix_items.iter().zip(arr).enumerate() {
                uneval.items.remove(&i);
                let path = format!("/prefixItems/{i}");
                if let Some(e) = self.validate_child(*sub, item, &path, &i.to_string()) {
                    self.add(errors, sch, e)?;
                }
            }
            if let Some(sub) = sch.items2020 {
                for (i, item) in arr.iter().enumerate().skip(sch.prefix_items.len()) {
                    uneval.items.remove(&i);
                    if let Some(e) = self.validate_child(sub, item, "/items", &i.to_string()) {
                        self.add(errors, sch, e)?;
                    }
                }
            }
        }

        if let Some(sub) = sch.contains {
            let mut matched = Vec::new();
            let mut item_errors = Vec::new();
            for (i, item) in arr.iter().enumerate() {
                match self.validate_child(sub, item, "/contains", &i.to_string()) {
                    None => {
                        matched.push(i);
                        if sch.draft_version >= 2020 {
                            uneval.items.remove(&i);
                        }
                    }
                    Some(e) => item_errors.push(e),
                }
            }
            let min = sch.min_contains.unwrap_or(1);
            if matched.len() < min {
                let err = if sch.min_contains.is_some() {
                    self.error_with(
                        sch,
                        "/minContains",
                        ErrorKind::MinContains {
                            got: matched.len(),
                            want: min,
                        },
                        item_errors,
                    )
                } else {
                    self.error_with(sch, "/contains", ErrorKind::Contains, item_errors)
                };
                self.add(errors, sch, err)?;
            }
            if let Some(max) = sch.max_contains {
                if matched.len() > max {
                    let err = self.error(
                        sch,
                        "/maxContains",
                        ErrorKind::MaxContains {
                            got: matched.len(),
                            want: max,
                        },
                    );
                    self.add(errors, sch, err)?;
                }
            }
        }
        Ok(())
    }

    fn unevaluated(
        &mut self,
        sch: &'s Schema,
        v: &Value,
        uneval: &mut Uneval,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), ValidationError> {
        if let (Some(sub), Value::Object(obj)) = (sch.unevaluated_properties, v) {
            let remaining: Vec<String> = uneval.props.iter().cloned().collect();
            for key in remaining {
                if let Some(e) =
                    self.validate_child(sub, &obj[&key], "/unevaluatedProperties", &key)
                {
                    self.add(errors, sch, e)?;
                }
            }
            uneval.props.clear();
        }
        if let (Some(sub), Value::Array(arr)) = (sch.unevaluated_items, v) {
            let remaining: Vec<usize> = uneval.items.iter().copied().collect();
            for i in remaining {
                if let Some(e) =
                    self.validate_child(sub, &arr[i], "/unevaluatedItems", &i.to_string())
                {
                    self.add(errors, sch, e)?;
                }
            }
            uneval.items.clear();
        }
        Ok(())
    }

    /// Evaluate a subschema against the same instance, under `kw_path`.
    fn in_place_branch(
        &mut self,
        sub: SchemaIndex,
        kw_path: &str,
        v: &Value,
    ) -> Result<Uneval, ValidationError> {
        let klen = self.kloc.len();
        self.kloc.push_str(kw_path);
        let result = self.validate_schema(sub, v);
        self.kloc.truncate(klen);
        result
    }

    /// Evaluate a subschema against a child of the instance.
    fn validate_child(
        &mut self,
        sub: SchemaIndex,
        v: &Value,
        kw_path: &str,
        vtok: &str,
    ) -> Option<ValidationError> {
        let klen = self.kloc.len();
        let vlen = self.vloc.len();
        self.kloc.push_str(kw_path);
        self.vloc.push('/');
        self.vloc.push_str(&escape(vtok));
        let result = self.validate_schema(sub, v);
        self.kloc.truncate(klen);
        self.vloc.truncate(vlen);
        result.err()
    }

    fn add(
        &mut self,
        errors: &mut Vec<ValidationError>,
        sch: &Schema,
        err: ValidationError,
    ) -> Result<(), ValidationError> {
        errors.push(err);
        if self.fail_fast {
            Err(self.seal(sch, std::mem::take(errors)))
        } else {
            Ok(())
        }
    }

    fn seal(&self, sch: &Schema, mut errors: Vec<ValidationError>) -> ValidationError {
        if errors.len() == 1 {
            errors.swap_remove(0)
        } else {
            self.error_with(sch, "", ErrorKind::Group, errors)
        }
    }

    fn error(&self, sch: &Schema, kw_path: &str, kind: ErrorKind) -> ValidationError {
        self.error_with(sch, kw_path, kind, Vec::new())
    }

    fn error_with(
        &self,
        sch: &Schema,
        kw_path: &str,
        kind: ErrorKind,
        causes: Vec<ValidationError>,
    ) -> ValidationError {
        ValidationError {
            keyword_location: format!("{}{}", self.kloc, kw_path),
            absolute_keyword_location: sch.up.format(kw_path),
            instance_location: self.vloc.clone(),
            kind,
            causes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use serde_json::json;

    fn compiled(doc: Value) -> (Schemas, SchemaIndex) {
        let mut c = Compiler::new();
        c.add_resource("http://test.example/s.json", doc).unwrap();
        let sch = c.compile("http://test.example/s.json").unwrap();
        (c.into_schemas(), sch)
    }

    fn validator(schemas: &Schemas, fail_fast: bool) -> Validator<'_> {
        Validator {
            schemas,
            fail_fast,
            vloc: String::new(),
            kloc: String::new(),
            scope: Vec::new(),
        }
    }

    #[test]
    fn uneval_starts_from_the_instance_shape() {
        let u = Uneval::of(&json!({"a": 1, "b": 2}));
        assert_eq!(u.props.len(), 2);
        assert!(u.items.is_empty());

        let u = Uneval::of(&json!([10, 20, 30]));
        assert!(u.props.is_empty());
        assert_eq!(u.items, (0..3).collect());

        let u = Uneval::of(&json!("scalar"));
        assert!(u.props.is_empty() && u.items.is_empty());
    }

    #[test]
    fn uneval_intersection_keeps_common_leftovers() {
        let instance = json!({"a": 1, "b": 2, "c": 3});
        let mut left = Uneval::of(&instance);
        let mut right = Uneval::of(&instance);
        left.props.remove("a");
        right.props.remove("b");
        left.intersect(&right);
        // only "c" is unevaluated on both sides
        assert_eq!(left.props.iter().collect::<Vec<_>>(), ["c"]);

        let items = json!([0, 1, 2]);
        let mut left = Uneval::of(&items);
        let mut right = Uneval::of(&items);
        left.items.remove(&0);
        right.items.remove(&2);
        left.intersect(&right);
        assert_eq!(left.items.iter().copied().collect::<Vec<_>>(), [1]);
    }

    #[test]
    fn validate_child_restores_locations() {
        let (schemas, sch) = compiled(json!({"type": "string"}));
        let mut vd = validator(&schemas, false);

        let err = vd
            .validate_child(sch, &json!(1), "/items", "0")
            .expect("child must fail");
        assert_eq!(err.keyword_location, "/items/type");
        assert_eq!(err.instance_location, "/0");
        assert!(err.absolute_keyword_location.ends_with("s.json#/type"));

        // both location strings unwound
        assert!(vd.kloc.is_empty());
        assert!(vd.vloc.is_empty());

        assert!(vd.validate_child(sch, &json!("ok"), "/items", "1").is_none());
        assert!(vd.kloc.is_empty() && vd.vloc.is_empty());
    }

    #[test]
    fn child_tokens_are_pointer_escaped() {
        let (schemas, sch) = compiled(json!({"type": "number"}));
        let mut vd = validator(&schemas, false);
        let err = vd
            .validate_child(sch, &json!("x"), "/properties/a~1b", "a/b")
            .expect("child must fail");
        assert_eq!(err.instance_location, "/a~1b");
    }

    #[test]
    fn in_place_branch_restores_keyword_location() {
        let (schemas, sch) = compiled(json!({"type": "number"}));
        let mut vd = validator(&schemas, false);

        let err = vd.in_place_branch(sch, "/allOf/0", &json!("s")).unwrap_err();
        assert_eq!(err.keyword_location, "/allOf/0/type");
        // instance location is unchanged for in-place evaluation
        assert_eq!(err.instance_location, "");
        assert!(vd.kloc.is_empty());

        assert!(vd.in_place_branch(sch, "/allOf/0", &json!(3)).is_ok());
        assert!(vd.kloc.is_empty());
    }

    #[test]
    fn self_reference_hits_the_cycle_guard() {
        let (schemas, sch) = compiled(json!({"$ref": "#"}));
        let mut vd = validator(&schemas, false);
        let err = vd.validate_schema(sch, &json!(1)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Reference { keyword: "$ref", .. }));
        assert!(matches!(err.causes[0].kind, ErrorKind::RefCycle { .. }));
        // the scope stack unwound despite the error
        assert!(vd.scope.is_empty());
    }

    #[test]
    fn descending_instances_do_not_trip_the_guard() {
        let (schemas, sch) = compiled(json!({
            "type": "object",
            "properties": { "next": { "$ref": "#" } }
        }));
        let mut vd = validator(&schemas, false);
        let deep = json!({"next": {"next": {}}});
        assert!(vd.validate_schema(sch, &deep).is_ok());
        assert!(vd.scope.is_empty());
    }

    #[test]
    fn fail_fast_seals_after_the_first_error() {
        let doc = json!({"const": "a", "enum": ["b"]});

        let (schemas, sch) = compiled(doc.clone());
        let mut vd = validator(&schemas, false);
        let err = vd.validate_schema(sch, &json!("c")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Group));
        assert_eq!(err.causes.len(), 2);

        let (schemas, sch) = compiled(doc);
        let mut vd = validator(&schemas, true);
        let err = vd.validate_schema(sch, &json!("c")).unwrap_err();
        // stopped at const, the first keyword in evaluation order
        assert!(matches!(err.kind, ErrorKind::Const { .. }));
        assert!(err.causes.is_empty());
    }

    #[test]
    fn boolean_schemas_short_circuit_the_frame() {
        let (schemas, sch) = compiled(json!(false));
        let mut vd = validator(&schemas, false);
        let err = vd.validate_schema(sch, &json!({"a": 1})).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::FalseSchema));
        assert!(vd.scope.is_empty());

        let (schemas, sch) = compiled(json!(true));
        let mut vd = validator(&schemas, false);
        let uneval = vd.validate_schema(sch, &json!({"a": 1})).unwrap();
        // a true schema evaluates nothing
        assert_eq!(uneval.props.len(), 1);
    }
}
