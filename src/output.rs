//! Structured validation results.
//!
//! Validation failures form a tree that mirrors the applicator nesting of
//! the schema. The tree can be projected into the `flag`, `basic` and
//! `detailed` output formats of the specification.

use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::value::{Type, Types};

/// One node of the validation error tree.
///
/// `instance_location` and `keyword_location` are JSON Pointers;
/// `keyword_location` is the dynamic path, so it includes `$ref` hops.
#[derive(Debug)]
pub struct ValidationError {
    pub keyword_location: String,
    pub absolute_keyword_location: String,
    pub instance_location: String,
    pub kind: ErrorKind,
    pub causes: Vec<ValidationError>,
}

/// What went wrong at one keyword.
///
/// Each variant carries the machine-readable context of its keyword.
#[derive(Debug)]
pub enum ErrorKind {
    /// Root of an error tree.
    Schema { url: String },
    /// Several keyword failures at one schema, with no specific keyword.
    Group,
    /// A referenced schema failed.
    Reference { keyword: &'static str, url: String },
    /// The same schema was entered twice for one instance location.
    RefCycle { url: String },
    FalseSchema,
    Type { got: Type, want: Types },
    Enum { want: Vec<Value> },
    Const { want: Value },
    Format { format: String, err: String },
    MultipleOf { got: Number, want: Number },
    Maximum { got: Number, want: Number },
    Minimum { got: Number, want: Number },
    ExclusiveMaximum { got: Number, want: Number },
    ExclusiveMinimum { got: Number, want: Number },
    MaxLength { got: usize, want: usize },
    MinLength { got: usize, want: usize },
    Pattern { got: String, want: String },
    ContentEncoding { want: String, err: String },
    ContentMediaType { want: String, err: String },
    ContentSchema,
    MaxProperties { got: usize, want: usize },
    MinProperties { got: usize, want: usize },
    Required { want: Vec<String> },
    DependentRequired { got: String, want: Vec<String> },
    AdditionalProperties { got: Vec<String> },
    PropertyName { prop: String },
    MaxItems { got: usize, want: usize },
    MinItems { got: usize, want: usize },
    UniqueItems { got: [usize; 2] },
    /// Items past the tuple positions are not allowed; `got` is the number
    /// of allowed positions.
    AdditionalItems { got: usize },
    Contains,
    MinContains { got: usize, want: usize },
    MaxContains { got: usize, want: usize },
    Not,
    AllOf,
    AnyOf,
    /// `got` holds the first two matched branches, or `None` if none did.
    OneOf { got: Option<[usize; 2]> },
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&item.to_string());
    }
    out
}

fn quote_join(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("{s:?}")).collect();
    join(&quoted)
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema { url } => write!(f, "jsonschema validation failed with {url}"),
            Self::Group => write!(f, "validation failed"),
            Self::Reference { keyword, url } => {
                write!(f, "does not match {keyword} schema {url}")
            }
            Self::RefCycle { url } => write!(f, "infinite loop detected at {url}"),
            Self::FalseSchema => write!(f, "false schema"),
            Self::Type { got, want } => write!(f, "got {got}, want {want}"),
            Self::Enum { want } => {
                if want.len() == 1 {
                    write!(f, "value must be {}", want[0])
                } else {
                    let values: Vec<String> = want.iter().map(|v| v.to_string()).collect();
                    write!(f, "value must be one of {}", join(&values))
                }
            }
            Self::Const { want } => write!(f, "value must be {want}"),
            Self::Format { format, err } => write!(f, "{format} format check failed: {err}"),
            Self::MultipleOf { got, want } => write!(f, "{got} is not a multiple of {want}"),
            Self::Maximum { got, want } => write!(f, "must be <= {want} but found {got}"),
            Self::Minimum { got, want } => write!(f, "must be >= {want} but found {got}"),
            Self::ExclusiveMaximum { got, want } => {
                write!(f, "must be < {want} but found {got}")
            }
            Self::ExclusiveMinimum { got, want } => {
                write!(f, "must be > {want} but found {got}")
            }
            Self::MaxLength { got, want } => {
                write!(f, "length must be <= {want} but found {got}")
            }
            Self::MinLength { got, want } => {
                write!(f, "length must be >= {want} but found {got}")
            }
            Self::Pattern { got, want } => {
                write!(f, "{got:?} does not match pattern {want:?}")
            }
            Self::ContentEncoding { want, err } => {
                write!(f, "value is not {want} encoded: {err}")
            }
            Self::ContentMediaType { want, err } => {
                write!(f, "value is not of media type {want}: {err}")
            }
            Self::ContentSchema => write!(f, "decoded content does not validate"),
            Self::MaxProperties { got, want } => {
                write!(f, "maximum {want} properties allowed, but found {got}")
            }
            Self::MinProperties { got, want } => {
                write!(f, "minimum {want} properties required, but found {got}")
            }
            Self::Required { want } => write!(f, "missing properties {}", quote_join(want)),
            Self::DependentRequired { got, want } => write!(
                f,
                "properties {} required, if {got:?} exists",
                quote_join(want)
            ),
            Self::AdditionalProperties { got } => {
                write!(f, "additional properties {} not allowed", quote_join(got))
            }
            Self::PropertyName { prop } => write!(f, "invalid property name {prop:?}"),
            Self::MaxItems { got, want } => {
                write!(f, "maximum {want} items allowed, but found {got}")
            }
            Self::MinItems { got, want } => {
                write!(f, "minimum {want} items required, but found {got}")
            }
            Self::UniqueItems { got } => {
                write!(f, "items at {} and {} are equal", got[0], got[1])
            }
            Self::AdditionalItems { got } => write!(f, "only {got} items are allowed"),
            Self::Contains => write!(f, "no item matches contains schema"),
            Self::MinContains { got, want } => {
                write!(f, "minimum {want} matches required, but found {got}")
            }
            Self::MaxContains { got, want } => {
                write!(f, "maximum {want} matches allowed, but found {got}")
            }
            Self::Not => write!(f, "not failed"),
            Self::AllOf => write!(f, "allOf failed"),
            Self::AnyOf => write!(f, "anyOf failed, none matched"),
            Self::OneOf { got } => match got {
                None => write!(f, "oneOf failed, none matched"),
                Some([a, b]) => write!(f, "oneOf failed, subschemas {a} and {b} matched"),
            },
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn leaf_lines(
            err: &ValidationError,
            f: &mut fmt::Formatter<'_>,
            indent: usize,
        ) -> fmt::Result {
            write!(f, "\n{:indent$}- at {:?}: {}", "", err.instance_location, err.kind)?;
            for cause in &err.causes {
                leaf_lines(cause, f, indent + 2)?;
            }
            Ok(())
        }

        if let ErrorKind::Schema { url } = &self.kind {
            write!(f, "jsonschema validation failed with {url}")?;
            for cause in &self.causes {
                leaf_lines(cause, f, 0)?;
            }
            Ok(())
        } else {
            leaf_lines(self, f, 0)
        }
    }
}

impl std::error::Error for ValidationError {}

/// `flag` output: validity only.
#[derive(Debug, Serialize)]
pub struct FlagOutput {
    pub valid: bool,
}

/// One unit of `basic`/`detailed` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputUnit {
    pub valid: bool,
    pub keyword_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_keyword_location: Option<String>,
    pub instance_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<OutputUnit>,
}

impl ValidationError {
    pub fn flag_output(&self) -> FlagOutput {
        FlagOutput { valid: false }
    }

    /// The `basic` format: a flat list of failed output units.
    pub fn basic_output(&self) -> OutputUnit {
        let mut errors = Vec::new();
        fn collect(err: &ValidationError, out: &mut Vec<OutputUnit>) {
            if !matches!(err.kind, ErrorKind::Schema { .. } | ErrorKind::Group) {
                out.push(OutputUnit {
                    valid: false,
                    keyword_location: err.keyword_location.clone(),
                    absolute_keyword_location: Some(err.absolute_keyword_location.clone()),
                    instance_location: err.instance_location.clone(),
                    error: Some(err.kind.to_string()),
                    errors: Vec::new(),
                });
            }
            for cause in &err.causes {
                collect(cause, out);
            }
        }
        collect(self, &mut errors);
        OutputUnit {
            valid: false,
            keyword_location: String::new(),
            absolute_keyword_location: None,
            instance_location: String::new(),
            error: None,
            errors,
        }
    }

    /// The `detailed` format: the hierarchy, with single-cause groups
    /// collapsed.
    pub fn detailed_output(&self) -> OutputUnit {
        fn build(err: &ValidationError) -> OutputUnit {
            if err.causes.len() == 1
                && matches!(err.kind, ErrorKind::Schema { .. } | ErrorKind::Group)
            {
                return build(&err.causes[0]);
            }
            let leaf = err.causes.is_empty();
            OutputUnit {
                valid: false,
                keyword_location: err.keyword_location.clone(),
                absolute_keyword_location: Some(err.absolute_keyword_location.clone()),
                instance_location: err.instance_location.clone(),
                error: leaf.then(|| err.kind.to_string()),
                errors: err.causes.iter().map(build).collect(),
            }
        }
        build(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(
        kw: &str,
        inst: &str,
        kind: ErrorKind,
        causes: Vec<ValidationError>,
    ) -> ValidationError {
        ValidationError {
            keyword_location: kw.to_string(),
            absolute_keyword_location: format!("http://x/s.json#{kw}"),
            instance_location: inst.to_string(),
            kind,
            causes,
        }
    }

    fn sample_tree() -> ValidationError {
        let type_err = node(
            "/properties/age/type",
            "/age",
            ErrorKind::Type {
                got: Type::of(&json!("old")),
                want: {
                    let mut want = Types::default();
                    want.add(Type::Integer);
                    want
                },
            },
            Vec::new(),
        );
        let required_err = node(
            "/required",
            "",
            ErrorKind::Required {
                want: vec!["name".to_string()],
            },
            Vec::new(),
        );
        node(
            "",
            "",
            ErrorKind::Schema {
                url: "http://x/s.json#".to_string(),
            },
            vec![node(
                "",
                "",
                ErrorKind::Group,
                vec![type_err, required_err],
            )],
        )
    }

    #[test]
    fn kind_messages() {
        assert_eq!(ErrorKind::FalseSchema.to_string(), "false schema");
        assert_eq!(
            ErrorKind::Enum { want: vec![json!("meow")] }.to_string(),
            r#"value must be "meow""#
        );
        assert_eq!(
            ErrorKind::Enum { want: vec![json!(1), json!(2)] }.to_string(),
            "value must be one of 1, 2"
        );
        assert_eq!(
            ErrorKind::Required {
                want: vec!["a".to_string(), "b".to_string()]
            }
            .to_string(),
            r#"missing properties "a", "b""#
        );
        assert_eq!(
            ErrorKind::MinLength { got: 1, want: 2 }.to_string(),
            "length must be >= 2 but found 1"
        );
        assert_eq!(
            ErrorKind::OneOf { got: None }.to_string(),
            "oneOf failed, none matched"
        );
        assert_eq!(
            ErrorKind::OneOf { got: Some([0, 1]) }.to_string(),
            "oneOf failed, subschemas 0 and 1 matched"
        );

        let mut want = Types::default();
        want.add(Type::Integer);
        let kind = ErrorKind::Type {
            got: Type::of(&json!("old")),
            want,
        };
        assert_eq!(kind.to_string(), "got string, want integer");
    }

    #[test]
    fn display_renders_causes_in_order() {
        let rendered = sample_tree().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "jsonschema validation failed with http://x/s.json#");
        assert_eq!(lines[1], r#"- at "": validation failed"#);
        assert_eq!(lines[2], r#"  - at "/age": got string, want integer"#);
        assert_eq!(lines[3], r#"  - at "": missing properties "name""#);
    }

    #[test]
    fn basic_output_flattens_and_skips_wrapper_nodes() {
        let basic = serde_json::to_value(sample_tree().basic_output()).unwrap();
        assert_eq!(basic["valid"], json!(false));
        let units = basic["errors"].as_array().unwrap();
        // the Schema and Group wrappers carry no unit of their own
        assert_eq!(units.len(), 2);
        assert_eq!(units[0]["instanceLocation"], json!("/age"));
        assert_eq!(units[0]["keywordLocation"], json!("/properties/age/type"));
        assert_eq!(
            units[0]["absoluteKeywordLocation"],
            json!("http://x/s.json#/properties/age/type")
        );
        assert_eq!(units[1]["error"], json!(r#"missing properties "name""#));
    }

    #[test]
    fn detailed_output_collapses_single_cause_wrappers() {
        let leaf = node("/type", "", ErrorKind::FalseSchema, Vec::new());
        let root = node(
            "",
            "",
            ErrorKind::Schema {
                url: "http://x/s.json#".to_string(),
            },
            vec![node("", "", ErrorKind::Group, vec![leaf])],
        );
        let detailed = root.detailed_output();
        // both wrappers collapse straight down to the leaf
        assert_eq!(detailed.keyword_location, "/type");
        assert_eq!(detailed.error.as_deref(), Some("false schema"));
        assert!(detailed.errors.is_empty());
    }

    #[test]
    fn detailed_output_keeps_multi_cause_hierarchy() {
        let detailed = sample_tree().detailed_output();
        // the two-cause group does not collapse
        assert!(detailed.error.is_none());
        assert_eq!(detailed.errors.len(), 2);
        assert_eq!(detailed.errors[0].instance_location, "/age");
        assert_eq!(detailed.errors[1].keyword_location, "/required");
    }

    #[test]
    fn flag_output_serializes_minimal() {
        let flag = serde_json::to_value(sample_tree().flag_output()).unwrap();
        assert_eq!(flag, json!({"valid": false}));
    }
}
