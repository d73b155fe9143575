//! Error types for the swagger-clap crate.

use thiserror::Error;

/// Errors that abort compiling a whole document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("unsupported OpenAPI document (swagger version: {})", .found.as_deref().unwrap_or("missing"))]
    UnsupportedDocument { found: Option<String> },

    #[error("unable to resolve {uri} against the API base")]
    ReferenceResolution {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

/// The `x-cli-config` extension could not be decoded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AutoConfigError {
    #[error("unable to decode x-cli-config")]
    Decode(#[source] serde_json::Error),
}
