//! Page-token pagination for collection responses.
//!
//! Collection endpoints wrap their array in an envelope carrying
//! `total_results` and, when more pages exist, `next_page_token`. The
//! parser exposes the next page as a `next` link and replaces the body with
//! the wrapped array so downstream filtering sees the collection itself.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

static PAGE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|&)page_token=\d+").expect("static regex must compile")
});

/// Query parameter carrying the page token.
pub const PAGE_TOKEN_PARAM: &str = "page_token";

const TOTAL_RESULTS: &str = "total_results";
const NEXT_PAGE_TOKEN: &str = "next_page_token";

/// A hypermedia relation attached to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub rel: String,
    pub uri: String,
}

/// A completed HTTP exchange as seen by link parsers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
    /// Links keyed by relation name
    pub links: BTreeMap<String, Vec<Link>>,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            links: BTreeMap::new(),
        }
    }

    /// URI of the first `next` link, if any.
    pub fn next_uri(&self) -> Option<&str> {
        self.links
            .get("next")
            .and_then(|links| links.first())
            .map(|l| l.uri.as_str())
    }
}

/// Extracts links from a parsed response, possibly rewriting its body.
pub trait LinkParser {
    /// `base` is the URL of the request that produced `resp`.
    fn parse_links(&self, base: &Url, resp: &mut Response);
}

/// Outcome of inspecting one response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    NotPaginated,
    Paginated {
        /// Query string of the next request, without the leading `?`
        next: Option<String>,
        /// Key of the array that holds the collection
        collection_key: Option<String>,
    },
}

/// Link parser for `page_token` pagination.
#[derive(Debug, Clone, Copy)]
pub struct PageTokenParser {
    paginate: bool,
}

impl Default for PageTokenParser {
    fn default() -> Self {
        Self { paginate: true }
    }
}

impl PageTokenParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable pagination handling.
    pub fn paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    /// Decide whether `body` is a page and what follows it.
    pub fn inspect(&self, base: &Url, body: &Value) -> Pagination {
        if !self.paginate {
            return Pagination::NotPaginated;
        }
        let Some(fields) = body.as_object() else {
            return Pagination::NotPaginated;
        };
        let Some(total) = fields.get(TOTAL_RESULTS).filter(|v| !v.is_null()) else {
            return Pagination::NotPaginated;
        };
        debug!(total_results = %total, "found a potential pagination situation");

        let next = fields
            .get(NEXT_PAGE_TOKEN)
            .and_then(token_text)
            .map(|token| next_query(base.query().unwrap_or(""), &token));
        if let Some(query) = &next {
            debug!(query = %query, "next page");
        }

        Pagination::Paginated {
            next,
            collection_key: collection_key(fields),
        }
    }
}

impl LinkParser for PageTokenParser {
    fn parse_links(&self, base: &Url, resp: &mut Response) {
        let Pagination::Paginated {
            next,
            collection_key,
        } = self.inspect(base, &resp.body)
        else {
            return;
        };

        if let Some(query) = next {
            let rel = "next".to_string();
            resp.links.entry(rel.clone()).or_default().push(Link {
                rel,
                uri: format!("?{query}"),
            });
        }

        if let Some(key) = collection_key {
            if let Some(items) = resp.body.get_mut(&key).map(Value::take) {
                resp.body = items;
            }
        }
    }
}

/// Page token as text. Empty strings and non-scalar values are not tokens.
fn token_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Rewrite `query` so it requests the page identified by `token`.
///
/// An existing numeric `page_token` parameter gets its value replaced;
/// otherwise the parameter is prepended.
pub fn next_query(query: &str, token: &str) -> String {
    let token = urlencoding::encode(token);
    if PAGE_TOKEN_RE.is_match(query) {
        return PAGE_TOKEN_RE
            .replace_all(query, |caps: &Captures| {
                format!("{}{PAGE_TOKEN_PARAM}={token}", &caps[1])
            })
            .into_owned();
    }
    if query.is_empty() {
        format!("{PAGE_TOKEN_PARAM}={token}")
    } else {
        format!("{PAGE_TOKEN_PARAM}={token}&{query}")
    }
}

/// First array-valued field in ascending key order.
fn collection_key(fields: &Map<String, Value>) -> Option<String> {
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();
    keys.into_iter()
        .find(|k| fields[k.as_str()].is_array())
        .cloned()
}
