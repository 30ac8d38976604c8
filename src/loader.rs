//! Schema loading from URLs.
//!
//! The compiler never touches the filesystem or network itself; it goes
//! through a [`UrlLoader`]. Loaded documents are cached per compiler, so a
//! given URL is fetched at most once. The official meta-schemas are embedded
//! and served without consulting any loader.

use std::collections::HashMap;
use std::fs::File;

use serde_json::Value;
use url::Url;

use crate::error::{BoxError, CompileError, LoadError};

/// Loads the document at an absolute URL.
///
/// Implementations exist per scheme; see [`SchemeUrlLoader`] for dispatch.
pub trait UrlLoader {
    /// # Errors
    ///
    /// Returns an error if the resource cannot be fetched or decoded.
    fn load(&self, url: &str) -> Result<Value, BoxError>;
}

/// Loads `file://` URLs from the filesystem.
pub struct FileLoader;

impl UrlLoader for FileLoader {
    fn load(&self, url: &str) -> Result<Value, BoxError> {
        let parsed = Url::parse(url)?;
        let path = parsed
            .to_file_path()
            .map_err(|()| format!("invalid file url {url}"))?;
        let file = File::open(&path)?;
        serde_json::from_reader(file).map_err(|src| {
            Box::new(LoadError::Decode {
                url: url.to_string(),
                src,
            }) as BoxError
        })
    }
}

/// Dispatches loading by URL scheme.
///
/// ```
/// use jsv::{FileLoader, SchemeUrlLoader};
///
/// let mut loader = SchemeUrlLoader::new();
/// loader.register("file", Box::new(FileLoader));
/// ```
#[derive(Default)]
pub struct SchemeUrlLoader {
    loaders: HashMap<&'static str, Box<dyn UrlLoader>>,
}

impl SchemeUrlLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scheme: &'static str, loader: Box<dyn UrlLoader>) {
        self.loaders.insert(scheme, loader);
    }
}

impl UrlLoader for SchemeUrlLoader {
    fn load(&self, url: &str) -> Result<Value, BoxError> {
        let parsed = Url::parse(url)?;
        let Some(loader) = self.loaders.get(parsed.scheme()) else {
            return Err(Box::new(LoadError::UnsupportedScheme {
                url: url.to_string(),
            }));
        };
        loader.load(url)
    }
}

/// The compiler-owned loading facade: cache, pre-seeded resources,
/// embedded meta-schemas, then the user loader.
pub(crate) struct DefaultUrlLoader {
    docs: HashMap<Url, Value>,
    loader: Box<dyn UrlLoader>,
}

impl DefaultUrlLoader {
    pub(crate) fn new() -> Self {
        let mut scheme_loader = SchemeUrlLoader::new();
        scheme_loader.register("file", Box::new(FileLoader));
        Self {
            docs: HashMap::new(),
            loader: Box::new(scheme_loader),
        }
    }

    pub(crate) fn use_loader(&mut self, loader: Box<dyn UrlLoader>) {
        self.loader = loader;
    }

    /// Pre-seed a document, bypassing the loader for this URL.
    pub(crate) fn add_doc(&mut self, url: Url, doc: Value) {
        self.docs.insert(url, doc);
    }

    pub(crate) fn load(&mut self, url: &Url) -> Result<&Value, CompileError> {
        if !self.docs.contains_key(url) {
            let doc = self.fetch(url)?;
            self.docs.insert(url.clone(), doc);
        }
        Ok(&self.docs[url])
    }

    fn fetch(&self, url: &Url) -> Result<Value, CompileError> {
        if let Some(src) = metaschema_source(url) {
            let doc = serde_json::from_str(src).map_err(|src| LoadError::Decode {
                url: url.to_string(),
                src,
            })?;
            return Ok(doc);
        }
        match self.loader.load(url.as_str()) {
            Ok(doc) => Ok(doc),
            Err(err) => match err.downcast::<LoadError>() {
                Ok(load_err) => Err((*load_err).into()),
                Err(src) => Err(LoadError::Load {
                    url: url.to_string(),
                    src,
                }
                .into()),
            },
        }
    }
}

/// Embedded official meta-schema documents, keyed by URL with the
/// `http`/`https` distinction erased.
fn metaschema_source(url: &Url) -> Option<&'static str> {
    let s = url.as_str();
    let s = s
        .strip_prefix("http://")
        .or_else(|| s.strip_prefix("https://"))?;
    Some(match s {
        "json-schema.org/draft/2020-12/schema" => {
            include_str!("../metaschemas/draft2020-12/schema.json")
        }
        "json-schema.org/draft/2020-12/meta/core" => {
            include_str!("../metaschemas/draft2020-12/meta/core.json")
        }
        "json-schema.org/draft/2020-12/meta/applicator" => {
            include_str!("../metaschemas/draft2020-12/meta/applicator.json")
        }
        "json-schema.org/draft/2020-12/meta/unevaluated" => {
            include_str!("../metaschemas/draft2020-12/meta/unevaluated.json")
        }
        "json-schema.org/draft/2020-12/meta/validation" => {
            include_str!("../metaschemas/draft2020-12/meta/validation.json")
        }
        "json-schema.org/draft/2020-12/meta/meta-data" => {
            include_str!("../metaschemas/draft2020-12/meta/meta-data.json")
        }
        "json-schema.org/draft/2020-12/meta/format-annotation" => {
            include_str!("../metaschemas/draft2020-12/meta/format-annotation.json")
        }
        "json-schema.org/draft/2020-12/meta/format-assertion" => {
            include_str!("../metaschemas/draft2020-12/meta/format-assertion.json")
        }
        "json-schema.org/draft/2020-12/meta/content" => {
            include_str!("../metaschemas/draft2020-12/meta/content.json")
        }
        "json-schema.org/draft/2019-09/schema" => {
            include_str!("../metaschemas/draft2019-09/schema.json")
        }
        "json-schema.org/draft/2019-09/meta/core" => {
            include_str!("../metaschemas/draft2019-09/meta/core.json")
        }
        "json-schema.org/draft/2019-09/meta/applicator" => {
            include_str!("../metaschemas/draft2019-09/meta/applicator.json")
        }
        "json-schema.org/draft/2019-09/meta/validation" => {
            include_str!("../metaschemas/draft2019-09/meta/validation.json")
        }
        "json-schema.org/draft/2019-09/meta/meta-data" => {
            include_str!("../metaschemas/draft2019-09/meta/meta-data.json")
        }
        "json-schema.org/draft/2019-09/meta/format" => {
            include_str!("../metaschemas/draft2019-09/meta/format.json")
        }
        "json-schema.org/draft/2019-09/meta/content" => {
            include_str!("../metaschemas/draft2019-09/meta/content.json")
        }
        "json-schema.org/draft-07/schema" => include_str!("../metaschemas/draft-07/schema.json"),
        "json-schema.org/draft-06/schema" => include_str!("../metaschemas/draft-06/schema.json"),
        "json-schema.org/draft-04/schema" => include_str!("../metaschemas/draft-04/schema.json"),
        _ => return None,
    })
}
