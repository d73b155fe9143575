//! Swagger 2.0 document → internal IR (intermediate representation)
//!
//! Walks the `paths` of a parsed document and compiles every (path, method)
//! pair into an `ApiOperation` that a command registry can consume.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::describe::describe_operation;
use crate::error::LoadError;
use crate::ext::{get_ext, EXT_DESCRIPTION, EXT_HIDDEN, EXT_IGNORE, EXT_NAME};
use crate::loader::Resolver;
use crate::naming::{kebab, resolve_name};
use crate::schema::{first_type, resolve_ref};

/// HTTP methods a Swagger 2.0 path item may declare, in compilation order.
const METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Marker set on operations flagged `deprecated: true`.
pub const DEPRECATED_MARKER: &str = "deprecated by the API";

/// A compiled API operation ready for CLI command generation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiOperation {
    /// Canonical command name (e.g. "list-users")
    pub name: String,
    /// First tag, or empty when the operation is untagged
    pub group: String,
    /// Additional names the command answers to
    pub aliases: Vec<String>,
    /// One-line summary for help listings
    pub short: String,
    /// Composed markdown description
    pub long: String,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Resolved, unescaped URI template (e.g. "https://api.example.com/users/{id}")
    pub uri_template: String,
    pub path_params: Vec<Param>,
    pub query_params: Vec<Param>,
    pub header_params: Vec<Param>,
    /// Media type of the request body, empty when the operation takes none
    pub body_media_type: String,
    /// Hidden from help output but still callable
    pub hidden: bool,
    /// Deprecation notice, empty when not deprecated
    pub deprecated: String,
}

/// Where a parameter is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Path,
    Query,
    Header,
}

impl Location {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            _ => None,
        }
    }
}

/// A single classified API parameter.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Param {
    pub name: String,
    /// `x-cli-name` override, empty when not set
    pub display_name: String,
    pub description: String,
    pub location: Location,
    /// Scalar type name, `array`, or `array[<item type>]`
    pub param_type: String,
    pub default: Option<Value>,
    pub example: Option<Value>,
    /// Attached `schema` node, used for rendering
    pub schema: Option<Value>,
    pub required: bool,
}

impl Param {
    /// Name used for the CLI argument or `--option`.
    pub fn option_name(&self) -> String {
        if self.display_name.is_empty() {
            kebab(&self.name)
        } else {
            self.display_name.clone()
        }
    }
}

/// Parameters of one operation, split by location.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedParams {
    pub path: Vec<Param>,
    pub query: Vec<Param>,
    pub header: Vec<Param>,
}

/// Compile every operation of `root` into an `ApiOperation`.
///
/// Paths are visited in key order and methods in a fixed order, so the
/// output is stable for a given document. Any resolution failure aborts the
/// whole document.
pub fn extract_operations(
    root: &Value,
    resolver: &dyn Resolver,
) -> Result<Vec<ApiOperation>, LoadError> {
    let mut ops = Vec::new();

    let paths = match root.get("paths").and_then(Value::as_object) {
        Some(p) => p,
        None => return Ok(ops),
    };

    let base_path = resolver.base().path().trim_end_matches('/').to_string();

    for (uri, path_item) in paths {
        if get_ext(path_item, EXT_IGNORE, false) {
            continue;
        }

        let target = format!("{base_path}{uri}");
        let resolved = resolver
            .resolve(&target)
            .map_err(|source| LoadError::ReferenceResolution {
                uri: target.clone(),
                source,
            })?;

        let uri_template = unescape(resolved.as_str());
        let template_path = unescape(resolved.path());

        for method in METHODS {
            let operation = match path_item.get(method) {
                Some(op) if op.is_object() => op,
                _ => continue,
            };
            if get_ext(operation, EXT_IGNORE, false) {
                continue;
            }

            ops.push(extract_single_operation(
                root,
                &method.to_uppercase(),
                &uri_template,
                &template_path,
                path_item,
                operation,
            ));
        }
    }

    Ok(ops)
}

fn unescape(s: &str) -> String {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

fn extract_single_operation(
    root: &Value,
    method: &str,
    uri_template: &str,
    template_path: &str,
    path_item: &Value,
    operation: &Value,
) -> ApiOperation {
    let (name, aliases) = resolve_name(operation, method, template_path);

    let params = classify_params(
        root,
        path_item.get("parameters"),
        operation.get("parameters"),
    );

    let content_type = first_media_type(operation, root, "produces");
    let long = describe_operation(root, operation, &params, &content_type);

    // Use the first tag as a best guess when there are several
    let group = operation
        .get("tags")
        .and_then(Value::as_array)
        .and_then(|tags| tags.first())
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let body_media_type = if has_body_param(root, path_item, operation) {
        first_media_type(operation, root, "consumes")
    } else {
        String::new()
    };

    let deprecated = if operation.get("deprecated").and_then(Value::as_bool) == Some(true) {
        DEPRECATED_MARKER.to_string()
    } else {
        String::new()
    };

    debug!(
        method,
        uri = uri_template,
        name = %name,
        path_params = params.path.len(),
        query_params = params.query.len(),
        header_params = params.header.len(),
        "compiled operation"
    );

    ApiOperation {
        name,
        group,
        aliases,
        short: operation
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        long,
        method: method.to_string(),
        uri_template: uri_template.to_string(),
        path_params: params.path,
        query_params: params.query,
        header_params: params.header,
        body_media_type,
        hidden: get_ext(operation, EXT_HIDDEN, false),
        deprecated,
    }
}

/// First entry of the operation's `key` list (`produces` / `consumes`),
/// falling back to the document-wide list and then to JSON.
fn first_media_type(operation: &Value, root: &Value, key: &str) -> String {
    [operation, root]
        .into_iter()
        .find_map(|node| {
            node.get(key)
                .and_then(Value::as_array)
                .and_then(|types| types.first())
                .and_then(Value::as_str)
        })
        .unwrap_or(DEFAULT_MEDIA_TYPE)
        .to_string()
}

fn has_body_param(root: &Value, path_item: &Value, operation: &Value) -> bool {
    [operation, path_item]
        .into_iter()
        .flat_map(|node| param_list(root, node.get("parameters")))
        .any(|p| {
            p.get("in").and_then(Value::as_str) == Some("body")
                && !get_ext(p, EXT_IGNORE, false)
        })
}

fn param_list<'a>(root: &'a Value, params: Option<&'a Value>) -> Vec<&'a Value> {
    params
        .and_then(Value::as_array)
        .map(|list| list.iter().map(|p| resolve_ref(root, p)).collect())
        .unwrap_or_default()
}

/// Merge path-level and operation-level parameters and split them by
/// location. Operation-level parameters win on name conflicts.
pub fn classify_params(
    root: &Value,
    path_level: Option<&Value>,
    operation_level: Option<&Value>,
) -> ClassifiedParams {
    let mut combined = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for p in param_list(root, operation_level) {
        if let Some(name) = p.get("name").and_then(Value::as_str) {
            seen.insert(name);
        }
        combined.push(p);
    }
    for p in param_list(root, path_level) {
        let name = p.get("name").and_then(Value::as_str).unwrap_or("");
        if !seen.contains(name) {
            combined.push(p);
        }
    }

    let mut out = ClassifiedParams::default();
    for p in combined {
        if get_ext(p, EXT_IGNORE, false) {
            continue;
        }
        let Some(param) = parse_param(root, p) else {
            continue;
        };
        match param.location {
            Location::Path => out.path.push(param),
            Location::Query => out.query.push(param),
            Location::Header => out.header.push(param),
        }
    }
    out
}

/// Parse a single parameter. Returns `None` for nameless parameters and
/// locations other than path, query and header.
fn parse_param(root: &Value, param: &Value) -> Option<Param> {
    let name = param.get("name")?.as_str()?.to_string();
    let location = Location::parse(param.get("in")?.as_str()?)?;

    let schema = param.get("schema");
    // Swagger 2 non-body parameters declare type, items and default inline.
    let type_source = schema.map(|s| resolve_ref(root, s)).unwrap_or(param);

    // TODO: support parameters declaring several types
    let mut param_type = first_type(type_source).unwrap_or("string").to_string();
    if param_type == "array" {
        let item_type = type_source
            .get("items")
            .filter(|items| items.is_object())
            .map(|items| resolve_ref(root, items))
            .and_then(first_type);
        if let Some(item_type) = item_type {
            param_type = format!("array[{item_type}]");
        }
    }

    let description = param
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    Some(Param {
        display_name: get_ext(param, EXT_NAME, String::new()),
        description: get_ext(param, EXT_DESCRIPTION, description),
        location,
        param_type,
        default: type_source.get("default").cloned(),
        example: type_source
            .get("example")
            .or_else(|| param.get("x-example"))
            .cloned(),
        schema: schema.cloned(),
        required: param
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        name,
    })
}
