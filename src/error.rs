//! Error types for schema loading and compilation.
//!
//! Validation failures are not represented here; they are returned as the
//! structured [`ValidationError`](crate::ValidationError) tree.

use thiserror::Error;

use crate::output::ValidationError;

/// Boxed error produced by loaders and extension hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors while loading a schema document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no loader registered for scheme of {url}")]
    UnsupportedScheme { url: String },

    #[error("failed to load {url}: {src}")]
    Load {
        url: String,
        #[source]
        src: BoxError,
    },

    #[error("failed to decode {url}: {src}")]
    Decode {
        url: String,
        #[source]
        src: serde_json::Error,
    },
}

/// Errors while compiling a schema.
///
/// Any of these is fatal to the `compile` call that produced it; no partial
/// schema is ever returned.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("error parsing url {url}")]
    ParseUrlError { url: String },

    #[error("invalid json pointer {0}")]
    InvalidJsonPointer(String),

    #[error("error parsing id at {url}")]
    ParseIdError { url: String },

    #[error("error parsing anchor at {url}")]
    ParseAnchorError { url: String },

    #[error("duplicate id {id:?} in {url}, at {ptr1:?} and {ptr2:?}")]
    DuplicateId {
        url: String,
        id: String,
        ptr1: String,
        ptr2: String,
    },

    #[error("duplicate anchor {anchor:?} in {url}, at {ptr1:?} and {ptr2:?}")]
    DuplicateAnchor {
        url: String,
        anchor: String,
        ptr1: String,
        ptr2: String,
    },

    #[error("anchor {anchor:?} not found in {url}")]
    AnchorNotFound { url: String, anchor: String },

    #[error("json pointer {url} does not resolve")]
    JsonPointerNotFound { url: String },

    #[error("vocabulary {vocabulary} in {url} is not supported")]
    UnsupportedVocabulary { url: String, vocabulary: String },

    #[error("metaschema {url} is not supported")]
    UnsupportedDraft { url: String },

    #[error("invalid value of {keyword:?} at {url}")]
    InvalidKeywordValue { url: String, keyword: &'static str },

    #[error("value at {url} is not a schema")]
    NotSchema { url: String },

    #[error("invalid regex {regex:?} at {url}: {src}")]
    InvalidRegex {
        url: String,
        regex: String,
        #[source]
        src: BoxError,
    },

    #[error("{url} does not validate against its metaschema: {src}")]
    SchemaValidation {
        url: String,
        #[source]
        src: Box<ValidationError>,
    },
}

impl CompileError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Load(_) => 3, // IO
            _ => 2,                     // schema error
        }
    }
}
