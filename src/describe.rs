//! Long-form help text for compiled operations.
//!
//! The description is markdown: the operation's own text, followed by
//! argument and option schema blocks and one section per response group.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::ext::{get_ext, EXT_DESCRIPTION};
use crate::schema::{render_schema, resolve_ref, SchemaMode};
use crate::spec::{ClassifiedParams, Param};

/// Status codes documented together because their content is identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseGroup {
    /// Status codes in ascending order
    pub codes: Vec<String>,
    /// Response content type, set only when a schema exists
    pub content_type: Option<String>,
    /// Read-mode schema rendering
    pub schema: Option<String>,
    /// Sorted header names of the group's first response
    pub headers: Vec<String>,
    /// Response description, only for single-code groups
    pub description: Option<String>,
}

/// Compose the long description of `operation`.
///
/// The result never starts with blank lines and always ends with exactly
/// one newline.
pub fn describe_operation(
    root: &Value,
    operation: &Value,
    params: &ClassifiedParams,
    content_type: &str,
) -> String {
    let declared = operation
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let mut desc = get_ext(operation, EXT_DESCRIPTION, declared);

    if !params.path.is_empty() {
        desc += "\n## Argument Schema:\n```schema\n{\n";
        for p in &params.path {
            desc += &format!("  {}: {}\n", p.option_name(), param_schema(root, p));
        }
        desc += "}\n```\n";
    }

    if !params.query.is_empty() || !params.header.is_empty() {
        desc += "\n## Option Schema:\n```schema\n{\n";
        for p in params.query.iter().chain(&params.header) {
            desc += &format!("  --{}: {}\n", p.option_name(), param_schema(root, p));
        }
        desc += "}\n```\n";
    }

    for group in group_responses(root, operation, content_type) {
        desc += &render_group(&group);
    }

    format!("{}\n", desc.trim_matches('\n'))
}

/// Rendered schema line for a parameter, falling back to its type and
/// description when no schema is attached.
fn param_schema(root: &Value, p: &Param) -> String {
    match &p.schema {
        Some(schema) => render_schema(root, schema, "  ", SchemaMode::Write),
        None => format!("({}): {}", p.param_type, p.description),
    }
}

/// Group the operation's responses by content equivalence.
///
/// Codes are visited in ascending order, so groups come out ordered by
/// their first code. Two responses share a group only when both carry a
/// schema and the digest of content type plus rendering matches; responses
/// without a body always stand alone.
pub fn group_responses(root: &Value, operation: &Value, content_type: &str) -> Vec<ResponseGroup> {
    let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut codes: Vec<&String> = responses.keys().filter(|k| !k.starts_with("x-")).collect();
    codes.sort();

    let mut buckets: Vec<(Option<[u8; 32]>, Vec<(&str, &Value)>)> = Vec::new();
    let mut renderings: Vec<Option<String>> = Vec::new();

    for code in codes {
        let resp = resolve_ref(root, &responses[code.as_str()]);
        if !resp.is_object() {
            continue;
        }

        let rendered = resp
            .get("schema")
            .map(|s| render_schema(root, s, "", SchemaMode::Read));
        let key = rendered.as_deref().map(|r| content_key(content_type, r));

        match key.and_then(|k| buckets.iter().position(|(other, _)| *other == Some(k))) {
            Some(i) => buckets[i].1.push((code.as_str(), resp)),
            None => {
                buckets.push((key, vec![(code.as_str(), resp)]));
                renderings.push(rendered);
            }
        }
    }

    buckets
        .into_iter()
        .zip(renderings)
        .map(|((_, entries), schema)| {
            let (_, first) = entries[0];

            let description = if entries.len() == 1 {
                let declared = first
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                Some(get_ext(first, EXT_DESCRIPTION, declared)).filter(|d| !d.is_empty())
            } else {
                None
            };

            let mut headers: Vec<String> = first
                .get("headers")
                .and_then(Value::as_object)
                .map(|h| h.keys().cloned().collect())
                .unwrap_or_default();
            headers.sort();

            ResponseGroup {
                codes: entries.iter().map(|(code, _)| code.to_string()).collect(),
                content_type: schema.as_ref().map(|_| content_type.to_string()),
                schema,
                headers,
                description,
            }
        })
        .collect()
}

fn content_key(content_type: &str, rendered: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(content_type.as_bytes());
    hasher.update([0]);
    hasher.update(rendered.as_bytes());
    hasher.finalize().into()
}

fn render_group(group: &ResponseGroup) -> String {
    let ct = group
        .content_type
        .as_ref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default();
    let no_body = group.schema.is_none();

    let mut out = if group.codes.len() == 1 {
        let mut s = format!("\n## Response {}{ct}\n", group.codes[0]);
        if let Some(d) = &group.description {
            s += &format!("\n{d}\n");
        } else if no_body {
            s += "\nResponse has no body\n";
        }
        s
    } else {
        let mut s = format!("\n## Responses {}{ct}\n", group.codes.join("/"));
        if no_body {
            s += "\nResponse has no body\n";
        }
        s
    };

    if !group.headers.is_empty() {
        out += &format!("\nHeaders: {}\n", group.headers.join(", "));
    }

    if let Some(schema) = &group.schema {
        out += &format!("\n```schema\n{schema}\n```\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::classify_params;
    use serde_json::json;

    const JSON: &str = "application/json";

    fn describe(op: &Value) -> String {
        let params = classify_params(&json!({}), None, op.get("parameters"));
        describe_operation(&json!({}), op, &params, JSON)
    }

    #[test]
    fn describe_uses_extension_override() {
        let op = json!({
            "description": "Original",
            "x-cli-description": "Overridden"
        });
        assert_eq!(describe(&op), "Overridden\n");
    }

    #[test]
    fn describe_empty_operation_is_single_newline() {
        assert_eq!(describe(&json!({})), "\n");
    }

    #[test]
    fn describe_argument_and_option_schema_blocks() {
        let op = json!({
            "description": "Get a user",
            "parameters": [
                { "name": "userId", "in": "path", "type": "string", "description": "User ID" },
                { "name": "X-Trace", "in": "header", "type": "string", "description": "Trace" },
                { "name": "verbose", "in": "query", "type": "boolean", "description": "Verbose" }
            ]
        });

        let expected = "Get a user\n\
\n## Argument Schema:\n```schema\n{\n  user-id: (string): User ID\n}\n```\n\
\n## Option Schema:\n```schema\n{\n  --verbose: (boolean): Verbose\n  --x-trace: (string): Trace\n}\n```\n";
        assert_eq!(describe(&op), expected);
    }

    #[test]
    fn describe_param_with_schema_renders_in_write_mode() {
        let op = json!({
            "parameters": [
                { "name": "filter", "in": "query", "schema": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "readOnly": true },
                        "q": { "type": "string" }
                    }
                } }
            ]
        });

        let desc = describe(&op);
        assert!(desc.contains("  --filter: {\n    q: (string)\n  }\n"), "{desc}");
        assert!(!desc.contains("id:"));
    }

    #[test]
    fn describe_distinct_responses_in_ascending_order() {
        let op = json!({
            "responses": {
                "404": { "description": "Not found",
                          "schema": { "type": "object", "properties": { "error": { "type": "string" } } } },
                "200": { "description": "OK",
                          "schema": { "type": "object", "properties": { "id": { "type": "string" } } } }
            }
        });

        let desc = describe(&op);
        let first = desc.find("## Response 200 (application/json)").unwrap();
        let second = desc.find("## Response 404 (application/json)").unwrap();
        assert!(first < second);
        assert!(desc.contains("\nOK\n"));
        assert!(desc.contains("\nNot found\n"));
        assert!(desc.contains("```schema\n{\n  id: (string)\n}\n```"));
    }

    #[test]
    fn group_responses_coalesces_identical_schemas() {
        let op = json!({
            "responses": {
                "200": { "description": "OK", "schema": { "type": "string" } },
                "201": { "description": "Created", "schema": { "type": "string" } },
                "400": { "description": "Bad", "schema": { "type": "integer" } }
            }
        });

        let groups = group_responses(&json!({}), &op, JSON);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].codes, vec!["200", "201"]);
        assert_eq!(groups[0].description, None);
        assert_eq!(groups[1].codes, vec!["400"]);
        assert_eq!(groups[1].description.as_deref(), Some("Bad"));

        let desc = describe(&op);
        assert!(desc.contains("## Responses 200/201 (application/json)\n"));
    }

    #[test]
    fn group_responses_never_coalesces_bodiless_responses() {
        let op = json!({
            "responses": {
                "204": { "description": "" },
                "304": { "description": "" },
                "404": { "description": "Missing" }
            }
        });

        let groups = group_responses(&json!({}), &op, JSON);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.codes.len() == 1));
        assert!(groups.iter().all(|g| g.content_type.is_none()));

        let desc = describe(&op);
        assert!(desc.contains("## Response 204\n\nResponse has no body\n"));
        assert!(desc.contains("## Response 304\n\nResponse has no body\n"));
        assert!(desc.contains("## Response 404\n\nMissing\n"));
    }

    #[test]
    fn group_responses_sorts_headers_and_reads_description_override() {
        let op = json!({
            "responses": {
                "200": {
                    "description": "OK",
                    "x-cli-description": "Everything worked",
                    "headers": {
                        "X-Rate-Limit": { "type": "integer" },
                        "ETag": { "type": "string" }
                    }
                }
            }
        });

        let groups = group_responses(&json!({}), &op, JSON);
        assert_eq!(groups[0].headers, vec!["ETag", "X-Rate-Limit"]);
        assert_eq!(groups[0].description.as_deref(), Some("Everything worked"));

        let desc = describe(&op);
        assert!(desc.ends_with("Everything worked\n\nHeaders: ETag, X-Rate-Limit\n"));
    }

    #[test]
    fn group_responses_resolves_response_refs() {
        let root = json!({
            "responses": {
                "NotFound": { "description": "Nothing here" }
            }
        });
        let op = json!({
            "responses": {
                "404": { "$ref": "#/responses/NotFound" },
                "x-extra": { "description": "ignored" }
            }
        });

        let groups = group_responses(&root, &op, JSON);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].description.as_deref(), Some("Nothing here"));
    }

    #[test]
    fn content_key_differs_by_content_type() {
        assert_ne!(
            content_key("application/json", "(string)"),
            content_key("text/plain", "(string)")
        );
        assert_ne!(content_key("application/json", "(string)"), [0u8; 32]);
    }
}
