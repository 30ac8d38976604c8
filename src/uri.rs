//! URL, fragment and JSON Pointer primitives.
//!
//! Schema locations are identified by an absolute URL plus either a JSON
//! Pointer fragment (RFC 6901) or a plain-name anchor fragment.

use std::fmt;
use std::path::Path;

use serde_json::Value;
use url::Url;

use crate::error::CompileError;

/// A decoded JSON Pointer: an ordered list of reference tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer(Vec<String>);

impl JsonPointer {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse an already percent-decoded pointer string such as `/a/b~0c`.
    pub(crate) fn parse(s: &str) -> Result<Self, CompileError> {
        if s.is_empty() {
            return Ok(Self::new());
        }
        if !s.starts_with('/') {
            return Err(CompileError::InvalidJsonPointer(s.to_string()));
        }
        let mut tokens = Vec::new();
        for tok in s[1..].split('/') {
            tokens.push(unescape(tok).ok_or_else(|| CompileError::InvalidJsonPointer(s.to_string()))?);
        }
        Ok(Self(tokens))
    }

    pub(crate) fn append(&self, tok: &str) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(tok.to_string());
        Self(tokens)
    }

    pub(crate) fn concat(&self, other: &JsonPointer) -> Self {
        let mut tokens = self.0.clone();
        tokens.extend(other.0.iter().cloned());
        Self(tokens)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn starts_with(&self, prefix: &JsonPointer) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Walk `doc` to the value this pointer addresses.
    pub(crate) fn lookup<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        let mut v = doc;
        for tok in &self.0 {
            v = match v {
                Value::Object(obj) => obj.get(tok)?,
                Value::Array(arr) => arr.get(parse_index(tok)?)?,
                _ => return None,
            };
        }
        Some(v)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tok in &self.0 {
            write!(f, "/{}", escape(tok))?;
        }
        Ok(())
    }
}

/// Escape a reference token per RFC 6901 (`~` first, then `/`).
pub(crate) fn escape(tok: &str) -> String {
    tok.replace('~', "~0").replace('/', "~1")
}

fn unescape(tok: &str) -> Option<String> {
    if !tok.contains('~') {
        return Some(tok.to_string());
    }
    let mut out = String::with_capacity(tok.len());
    let mut chars = tok.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}

/// Array index token: non-negative decimal, no leading zeros.
fn parse_index(tok: &str) -> Option<usize> {
    if tok.len() > 1 && tok.starts_with('0') {
        return None;
    }
    tok.parse().ok()
}

/// The fragment part of a schema reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    /// Empty or `/`-prefixed fragment.
    JsonPointer(JsonPointer),
    /// Plain-name fragment targeting an `$anchor` or fragment `$id`.
    Anchor(String),
}

impl Fragment {
    /// Parse a raw (possibly percent-encoded) fragment string.
    pub(crate) fn parse(raw: &str) -> Result<Self, CompileError> {
        let decoded = percent_decode(raw)
            .ok_or_else(|| CompileError::ParseUrlError { url: format!("#{raw}") })?;
        if decoded.is_empty() || decoded.starts_with('/') {
            Ok(Fragment::JsonPointer(JsonPointer::parse(&decoded)?))
        } else {
            Ok(Fragment::Anchor(decoded))
        }
    }
}

fn percent_decode(s: &str) -> Option<String> {
    if !s.contains('%') {
        return Some(s.to_string());
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// An absolute URL split from its fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UrlFrag {
    pub(crate) url: Url,
    pub(crate) frag: Fragment,
}

impl UrlFrag {
    /// Resolve `ref_` against `base` per RFC 3986 and split off the fragment.
    pub(crate) fn absolute(base: &Url, ref_: &str) -> Result<UrlFrag, CompileError> {
        let (uri_part, frag_part) = split_ref(ref_);
        let mut url = if uri_part.is_empty() {
            base.clone()
        } else {
            base.join(uri_part).map_err(|_| CompileError::ParseUrlError { url: ref_.to_string() })?
        };
        url.set_fragment(None);
        Ok(UrlFrag { url, frag: Fragment::parse(frag_part)? })
    }

    /// Interpret a user-supplied location: an absolute URL, or a file path
    /// resolved against the current directory.
    pub(crate) fn parse(loc: &str) -> Result<UrlFrag, CompileError> {
        let (uri_part, frag_part) = split_ref(loc);
        if let Ok(url) = Url::parse(uri_part) {
            // Single-letter schemes are likelier to be Windows drives than URLs.
            if url.scheme().len() > 1 {
                return Ok(UrlFrag { url, frag: Fragment::parse(frag_part)? });
            }
        }
        let path = Path::new(uri_part);
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|_| CompileError::ParseUrlError { url: loc.to_string() })?
                .join(path)
        };
        let url = Url::from_file_path(&abs)
            .map_err(|_| CompileError::ParseUrlError { url: loc.to_string() })?;
        Ok(UrlFrag { url, frag: Fragment::parse(frag_part)? })
    }
}

/// Split a reference into its URI and fragment parts.
pub(crate) fn split_ref(s: &str) -> (&str, &str) {
    match s.find('#') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    }
}

/// Identity of one schema location: document URL plus JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct UrlPtr {
    pub(crate) url: Url,
    pub(crate) ptr: JsonPointer,
}

impl UrlPtr {
    pub(crate) fn lookup<'a>(&self, doc: &'a Value) -> Result<&'a Value, CompileError> {
        self.ptr
            .lookup(doc)
            .ok_or_else(|| CompileError::JsonPointerNotFound { url: self.to_string() })
    }

    pub(crate) fn format(&self, kw_path: &str) -> String {
        if kw_path.is_empty() {
            self.to_string()
        } else {
            format!("{}#{}{}", self.url, self.ptr, kw_path)
        }
    }
}

impl fmt::Display for UrlPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.url, self.ptr)
    }
}

/// Check a plain-name anchor against the draft's fragment grammar.
pub(crate) fn valid_anchor(anchor: &str, draft_version: u16) -> bool {
    let mut chars = anchor.chars();
    let Some(first) = chars.next() else { return false };
    let first_ok = first.is_ascii_alphabetic() || (draft_version >= 2020 && first == '_');
    first_ok
        && chars.all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pointer_roundtrip() {
        let ptr = JsonPointer::parse("/a~1b/c~0d").unwrap();
        assert_eq!(ptr.to_string(), "/a~1b/c~0d");
        let doc = json!({"a/b": {"c~d": 1}});
        assert_eq!(ptr.lookup(&doc), Some(&json!(1)));
    }

    #[test]
    fn pointer_array_index() {
        let ptr = JsonPointer::parse("/items/1").unwrap();
        let doc = json!({"items": [10, 20]});
        assert_eq!(ptr.lookup(&doc), Some(&json!(20)));

        // leading zeros are not valid indices
        let ptr = JsonPointer::parse("/items/01").unwrap();
        assert_eq!(ptr.lookup(&doc), None);
    }

    #[test]
    fn pointer_must_start_with_slash() {
        assert!(matches!(
            JsonPointer::parse("a/b"),
            Err(CompileError::InvalidJsonPointer(_))
        ));
    }

    #[test]
    fn fragment_kinds() {
        assert!(matches!(Fragment::parse("").unwrap(), Fragment::JsonPointer(p) if p.is_empty()));
        assert!(matches!(Fragment::parse("/a").unwrap(), Fragment::JsonPointer(_)));
        assert!(matches!(Fragment::parse("foo").unwrap(), Fragment::Anchor(a) if a == "foo"));
    }

    #[test]
    fn fragment_percent_decoding() {
        match Fragment::parse("/a%20b").unwrap() {
            Fragment::JsonPointer(p) => {
                assert_eq!(p.lookup(&json!({"a b": true})), Some(&json!(true)));
            }
            other => panic!("expected pointer, got {other:?}"),
        }
    }

    #[test]
    fn absolute_resolution() {
        let base = Url::parse("http://example.com/dir/schema.json").unwrap();
        let uf = UrlFrag::absolute(&base, "other.json#/defs/a").unwrap();
        assert_eq!(uf.url.as_str(), "http://example.com/dir/other.json");
        assert!(matches!(uf.frag, Fragment::JsonPointer(_)));

        let uf = UrlFrag::absolute(&base, "#foo").unwrap();
        assert_eq!(uf.url.as_str(), "http://example.com/dir/schema.json");
        assert!(matches!(uf.frag, Fragment::Anchor(a) if a == "foo"));
    }

    #[test]
    fn parse_file_location() {
        let uf = UrlFrag::parse("/tmp/schema.json").unwrap();
        assert_eq!(uf.url.scheme(), "file");

        let uf = UrlFrag::parse("https://example.com/s.json").unwrap();
        assert_eq!(uf.url.scheme(), "https");
    }

    #[test]
    fn anchor_grammar() {
        assert!(valid_anchor("foo", 2019));
        assert!(valid_anchor("a-b_c:d.e", 2019));
        assert!(!valid_anchor("1foo", 2019));
        assert!(!valid_anchor("_foo", 2019));
        assert!(valid_anchor("_foo", 2020));
        assert!(!valid_anchor("", 2020));
    }
}
