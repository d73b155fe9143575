//! Typed access to `x-cli-*` vendor extensions.
//!
//! Extensions live as plain keys on any JSON object node of the document.
//! Every lookup takes a default and never fails: a missing key, a non-object
//! node, or a value of the wrong type all yield the default.

use serde_json::Value;

/// Change the CLI name for an operation or parameter.
pub const EXT_NAME: &str = "x-cli-name";

/// Additional command aliases for an operation.
pub const EXT_ALIASES: &str = "x-cli-aliases";

/// Change the description of an operation, parameter or response.
pub const EXT_DESCRIPTION: &str = "x-cli-description";

/// Ignore a path, operation, or parameter.
pub const EXT_IGNORE: &str = "x-cli-ignore";

/// Hide a command from help output while keeping it callable.
pub const EXT_HIDDEN: &str = "x-cli-hidden";

/// Document-level auto-configuration block.
pub const EXT_CLI_CONFIG: &str = "x-cli-config";

/// Conversion from a raw extension value into a concrete type.
pub trait FromExt: Sized {
    fn from_ext(value: &Value) -> Option<Self>;
}

impl FromExt for String {
    fn from_ext(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FromExt for bool {
    fn from_ext(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromExt for i64 {
    fn from_ext(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromExt for f64 {
    fn from_ext(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromExt for Value {
    fn from_ext(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Return the extension `key` of `node` converted to `T`, or `default`.
///
/// A JSON `null` counts as absent.
pub fn get_ext<T: FromExt>(node: &Value, key: &str, default: T) -> T {
    node.get(key)
        .filter(|v| !v.is_null())
        .and_then(T::from_ext)
        .unwrap_or(default)
}

/// Return the sequence extension `key` of `node`, keeping only the entries
/// that convert to `T`.
///
/// `default` is returned when the key is missing, not an array, or empty.
pub fn get_ext_list<T: FromExt>(node: &Value, key: &str, default: Vec<T>) -> Vec<T> {
    match node.get(key).and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items.iter().filter_map(T::from_ext).collect(),
        _ => default,
    }
}
