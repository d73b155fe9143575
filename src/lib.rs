//! Compile Swagger 2.0 documents into CLI commands and follow page-token
//! pagination.
//!
//! Takes a parsed Swagger 2.0 document, compiles every operation into an
//! `ApiOperation` (names, aliases, classified parameters, generated help),
//! optionally builds a clap `Command` tree from them, and derives `next`
//! links from paginated collection responses.
//!
//! # Usage
//!
//! ```no_run
//! use swagger_clap::{build_commands, BaseResolver, CliConfig, LinkParser, PageTokenParser, Response, SwaggerLoader};
//!
//! let doc: serde_json::Value = serde_json::from_str(r#"{"swagger":"2.0","paths":{}}"#).unwrap();
//! let resolver = BaseResolver::parse("https://api.example.com").unwrap();
//! let api = SwaggerLoader::new().load(&resolver, &doc).unwrap();
//!
//! let cmd = build_commands(&CliConfig::new("myapi"), &api);
//!
//! let mut resp = Response::new(200, serde_json::json!({"total_results": 1, "items": [1]}));
//! let request = swagger_clap::url::Url::parse("https://api.example.com/items").unwrap();
//! PageTokenParser::new().parse_links(&request, &mut resp);
//! ```

pub mod autoconfig;
pub mod builder;
pub mod describe;
pub mod error;
pub mod ext;
pub mod links;
pub mod loader;
pub mod naming;
pub mod schema;
pub mod spec;

pub use autoconfig::{AuthSpec, AutoConfig, PromptVar};
pub use builder::{build_commands, find_operation, normalize_group, CliConfig, CommandNaming};
pub use describe::ResponseGroup;
pub use error::{AutoConfigError, LoadError};
pub use links::{Link, LinkParser, PageTokenParser, Pagination, Response};
pub use loader::{Api, BaseResolver, Resolver, SwaggerLoader};
pub use spec::{ApiOperation, Location, Param};

// Re-export dependencies for downstream crates
pub use clap;
pub use url;
