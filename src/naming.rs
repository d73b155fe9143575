//! Command names and aliases for compiled operations.

use serde_json::Value;

use crate::ext::{get_ext, get_ext_list, EXT_ALIASES, EXT_NAME};

/// Convert an identifier to kebab case.
///
/// Case changes and any non-alphanumeric characters start a new word:
/// `"listUsers"` → `"list-users"`, `"getHTTPStatus"` → `"get-http-status"`,
/// `"GET-v1/users/{id}"` → `"get-v1-users-id"`.
pub fn kebab(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    let mut boundary = false;

    for i in 0..chars.len() {
        let c = chars[i];
        if !c.is_alphanumeric() {
            boundary = true;
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                boundary = true;
            }
        }
        if boundary && !result.is_empty() {
            result.push('-');
        }
        boundary = false;
        result.extend(c.to_lowercase());
    }
    result
}

/// Legacy slug of an identifier: lower-cased, with everything outside
/// `[a-z0-9_-]` turned into a dash and dash runs collapsed.
///
/// `"listUsers"` → `"listusers"`.
pub fn slug(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' {
            result.push(c);
        } else if !result.is_empty() && !result.ends_with('-') {
            result.push('-');
        }
    }
    while result.ends_with('-') {
        result.pop();
    }
    result
}

/// Resolve the canonical command name and alias list for an operation.
///
/// `method` is the upper-case HTTP method and `path` the unescaped URI
/// template path, used only when the operation has no `operationId`.
pub fn resolve_name(operation: &Value, method: &str, path: &str) -> (String, Vec<String>) {
    let operation_id = operation
        .get("operationId")
        .and_then(Value::as_str)
        .unwrap_or("");

    let mut aliases: Vec<String> = Vec::new();

    let mut name = kebab(operation_id);
    if name.is_empty() {
        name = kebab(&format!("{method}-{}", path.trim_matches('/')));
    }

    let rename = get_ext(operation, EXT_NAME, String::new());
    if !rename.is_empty() {
        name = rename;
    } else {
        // Older releases named commands with a plain slug; keep it callable.
        let legacy = slug(operation_id);
        if !legacy.is_empty() && legacy != name {
            aliases.push(legacy);
        }
    }
    aliases.extend(get_ext_list(operation, EXT_ALIASES, Vec::new()));

    (name, aliases)
}
