//! Content encodings and media types.
//!
//! `contentEncoding` decodes a string instance into bytes; `contentMediaType`
//! validates those bytes and, when it can unmarshal them, feeds the result to
//! `contentSchema`. These keywords assert only when content assertions are
//! enabled on the compiler.

use base64::Engine;
use serde_json::Value;

use crate::error::BoxError;

/// A named `contentEncoding` decoder.
#[derive(Clone)]
pub struct Decoder {
    pub name: String,
    pub func: fn(&str) -> Result<Vec<u8>, BoxError>,
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder").field("name", &self.name).finish()
    }
}

/// A named `contentMediaType` validator with an optional unmarshal hook.
///
/// When `unmarshal` is present and the schema carries `contentSchema`, the
/// unmarshalled value is validated against it.
#[derive(Clone)]
pub struct MediaType {
    pub name: String,
    pub func: fn(&[u8]) -> Result<(), BoxError>,
    pub unmarshal: Option<fn(&[u8]) -> Result<Value, BoxError>>,
}

impl std::fmt::Debug for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaType").field("name", &self.name).finish()
    }
}

pub(crate) fn builtin_decoders() -> Vec<Decoder> {
    vec![Decoder {
        name: "base64".to_string(),
        func: decode_base64,
    }]
}

pub(crate) fn builtin_media_types() -> Vec<MediaType> {
    vec![MediaType {
        name: "application/json".to_string(),
        func: validate_json,
        unmarshal: Some(unmarshal_json),
    }]
}

fn decode_base64(s: &str) -> Result<Vec<u8>, BoxError> {
    Ok(base64::engine::general_purpose::STANDARD.decode(s)?)
}

fn validate_json(bytes: &[u8]) -> Result<(), BoxError> {
    serde_json::from_slice::<serde::de::IgnoredAny>(bytes)?;
    Ok(())
}

fn unmarshal_json(bytes: &[u8]) -> Result<Value, BoxError> {
    Ok(serde_json::from_slice(bytes)?)
}
