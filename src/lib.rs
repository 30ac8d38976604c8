//! JSON Schema compiler and validator.
//!
//! Supports Draft 4, Draft 6, Draft 7, Draft 2019-09 and Draft 2020-12,
//! including `$ref`/`$recursiveRef`/`$dynamicRef` resolution across
//! documents, vocabulary-aware dialects, annotation-driven
//! `unevaluatedProperties`/`unevaluatedItems`, and structured errors that
//! project into the `flag`, `basic` and `detailed` output formats.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), jsv::CompileError> {
//! use jsv::Compiler;
//! use serde_json::json;
//!
//! let mut compiler = Compiler::new();
//! compiler.add_resource("schema.json", json!({
//!     "type": "object",
//!     "properties": {
//!         "speak": { "const": "meow" }
//!     },
//!     "required": ["speak"]
//! }))?;
//! let sch = compiler.compile("schema.json")?;
//! let schemas = compiler.into_schemas();
//!
//! assert!(schemas.is_valid(&json!({ "speak": "meow" }), sch));
//! assert!(!schemas.is_valid(&json!({ "speak": "bow" }), sch));
//! # Ok(())
//! # }
//! ```
//!
//! # Loading
//!
//! Documents come from three places: resources pre-seeded with
//! [`Compiler::add_resource`], the embedded official meta-schemas, and a
//! pluggable [`UrlLoader`]. Only the `file` scheme is wired up by default;
//! register loaders for other schemes with [`SchemeUrlLoader`].
//!
//! # Extensions
//!
//! Custom formats, content encodings, content media types and even the
//! regex engine are registered on the [`Compiler`] and take effect at
//! compile time. Compiled schemas are immutable; validation never mutates
//! the instance.

mod compiler;
mod content;
mod draft;
mod error;
mod format;
mod loader;
mod output;
mod root;
mod schema;
mod uri;
mod validator;
mod value;

pub use compiler::{Compiler, Regexp, RegexpEngine};
pub use content::{Decoder, MediaType};
pub use draft::Draft;
pub use error::{BoxError, CompileError, LoadError};
pub use format::Format;
pub use loader::{FileLoader, SchemeUrlLoader, UrlLoader};
pub use output::{ErrorKind, FlagOutput, OutputUnit, ValidationError};
pub use schema::{SchemaIndex, Schemas};
pub use value::{equals, Type, Types};
