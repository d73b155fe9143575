//! Swagger 2.0 loader
//!
//! Detects Swagger 2.0 documents and compiles a parsed document into an
//! [`Api`]. Fetching and parsing the document is left to the host.

use std::sync::LazyLock;

use regex::bytes::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::autoconfig::{load_auto_config, AutoConfig};
use crate::error::LoadError;
use crate::ext::{get_ext, EXT_DESCRIPTION, EXT_NAME};
use crate::spec::{extract_operations, ApiOperation};

static SWAGGER2_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]?swagger['"]?\s*:\s*['"]?2"#).expect("static regex must compile")
});

const LOCATION_HINTS: [&str; 4] = [
    "/swagger.json",
    "/swagger.yaml",
    "swagger.json",
    "swagger.yaml",
];

/// Resolves relative URIs against the API base.
pub trait Resolver {
    fn base(&self) -> &Url;
    fn resolve(&self, uri: &str) -> Result<Url, url::ParseError>;
}

/// A [`Resolver`] that joins URIs onto a fixed base URL.
#[derive(Debug, Clone)]
pub struct BaseResolver {
    base: Url,
}

impl BaseResolver {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        Url::parse(base).map(Self::new)
    }
}

impl Resolver for BaseResolver {
    fn base(&self) -> &Url {
        &self.base
    }

    fn resolve(&self, uri: &str) -> Result<Url, url::ParseError> {
        self.base.join(uri)
    }
}

/// A compiled API description.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Api {
    pub short: String,
    pub long: String,
    pub operations: Vec<ApiOperation>,
    pub auto_config: Option<AutoConfig>,
}

/// Loader for Swagger 2.0 documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwaggerLoader;

impl SwaggerLoader {
    pub fn new() -> Self {
        Self
    }

    /// Paths, relative to the API base, where a document is usually found.
    pub fn location_hints(&self) -> &'static [&'static str] {
        &LOCATION_HINTS
    }

    /// Whether the raw document body looks like Swagger 2.0.
    pub fn detect(&self, body: &[u8]) -> bool {
        SWAGGER2_RE.is_match(body)
    }

    /// Compile a parsed document.
    ///
    /// Fails without returning any operations when the document is not
    /// Swagger 2.0 or a path cannot be resolved against the base.
    pub fn load(&self, resolver: &dyn Resolver, doc: &Value) -> Result<Api, LoadError> {
        let version = doc.get("swagger").and_then(Value::as_str);
        if !version.is_some_and(|v| v.starts_with('2')) {
            let found = version
                .or_else(|| doc.get("openapi").and_then(Value::as_str))
                .map(str::to_owned);
            return Err(LoadError::UnsupportedDocument { found });
        }

        let operations = extract_operations(doc, resolver)?;

        let (short, long) = match doc.get("info") {
            Some(info) => {
                let title = info.get("title").and_then(Value::as_str).unwrap_or("");
                let description = info
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                (
                    get_ext(info, EXT_NAME, title.to_string()),
                    get_ext(info, EXT_DESCRIPTION, description.to_string()),
                )
            }
            None => (String::new(), String::new()),
        };

        debug!(
            base = %resolver.base(),
            operations = operations.len(),
            "loaded swagger document"
        );

        Ok(Api {
            short,
            long,
            operations,
            auto_config: load_auto_config(doc),
        })
    }
}
