//! JSON schema rendering for generated help text.
//!
//! Produces the compact, indentation-based notation used inside the
//! ```` ```schema ```` blocks of an operation's long description. Local
//! `#/...` references are followed against the document root.

use serde_json::{Map, Value};

/// Which side of the wire a schema is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Response bodies: `writeOnly` properties are skipped.
    Read,
    /// Request bodies and parameters: `readOnly` properties are skipped.
    Write,
}

const MAX_REF_HOPS: usize = 32;

/// Follow local `$ref` pointers from `node` until a concrete node is reached.
///
/// Unresolvable references stop the walk and return the last node seen.
pub fn resolve_ref<'a>(root: &'a Value, node: &'a Value) -> &'a Value {
    let mut current = node;
    for _ in 0..MAX_REF_HOPS {
        match current
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| lookup_pointer(root, r))
        {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

fn lookup_pointer<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    root.pointer(reference.strip_prefix('#')?)
}

/// First declared type of a schema. Accepts both `"type": "x"` and the
/// list form `"type": ["x", "null"]`.
pub fn first_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(types) => types.iter().find_map(Value::as_str),
        _ => None,
    }
}

/// Render `schema` with every nested line prefixed by `indent`.
pub fn render_schema(root: &Value, schema: &Value, indent: &str, mode: SchemaMode) -> String {
    let mut expanding = Vec::new();
    render(root, schema, indent, mode, &mut expanding)
}

fn render(
    root: &Value,
    schema: &Value,
    indent: &str,
    mode: SchemaMode,
    expanding: &mut Vec<String>,
) -> String {
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        if expanding.iter().any(|r| r == reference) {
            return "<recursive ref>".to_string();
        }
        let Some(target) = lookup_pointer(root, reference) else {
            return "<any>".to_string();
        };
        expanding.push(reference.to_string());
        let out = render(root, target, indent, mode, expanding);
        expanding.pop();
        return out;
    }

    let doc = schema
        .get("title")
        .or_else(|| schema.get("description"))
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .map(|d| format!(" {d}"))
        .unwrap_or_default();

    let typ = first_type(schema);
    let is_object = typ == Some("object")
        || (typ.is_none()
            && (schema.get("properties").is_some() || schema.get("allOf").is_some()));

    if typ == Some("array") {
        return match schema.get("items") {
            Some(items) if items.is_object() => {
                let nested = format!("{indent}  ");
                format!(
                    "[\n{nested}{}\n{indent}]{doc}",
                    render(root, items, &nested, mode, expanding)
                )
            }
            _ => format!("[<any>]{doc}"),
        };
    }

    if is_object {
        return render_object(root, schema, indent, mode, expanding, &doc);
    }

    format!("({}){doc}", scalar_facets(schema, typ.unwrap_or("any")))
}

fn render_object(
    root: &Value,
    schema: &Value,
    indent: &str,
    mode: SchemaMode,
    expanding: &mut Vec<String>,
    doc: &str,
) -> String {
    let mut properties = Map::new();
    let mut required: Vec<String> = Vec::new();
    collect_properties(root, schema, expanding, &mut properties, &mut required);

    let additional = schema
        .get("additionalProperties")
        .filter(|a| a.is_object() || a.as_bool() == Some(true));

    if properties.is_empty() && additional.is_none() {
        return format!("(object){doc}");
    }

    let nested = format!("{indent}  ");
    let mut keys: Vec<&String> = properties.keys().collect();
    keys.sort();

    let mut out = String::from("{\n");
    for key in keys {
        let prop = &properties[key.as_str()];
        let resolved = resolve_ref(root, prop);
        let flag = |name: &str| resolved.get(name).and_then(Value::as_bool) == Some(true);
        if (mode == SchemaMode::Write && flag("readOnly"))
            || (mode == SchemaMode::Read && flag("writeOnly"))
        {
            continue;
        }

        let mut name = key.clone();
        if required.iter().any(|r| r == key) {
            name.push('*');
        }
        out += &format!(
            "{nested}{name}: {}\n",
            render(root, prop, &nested, mode, expanding)
        );
    }

    if let Some(additional) = additional {
        let rendered = if additional.is_object() {
            render(root, additional, &nested, mode, expanding)
        } else {
            "<any>".to_string()
        };
        out += &format!("{nested}<any>: {rendered}\n");
    }

    out += &format!("{indent}}}{doc}");
    out
}

/// Gather properties and required names from the schema and any `allOf`
/// members. Later members override earlier ones on name clashes.
///
/// Members referring to a schema already being expanded are skipped.
fn collect_properties(
    root: &Value,
    schema: &Value,
    expanding: &mut Vec<String>,
    properties: &mut Map<String, Value>,
    required: &mut Vec<String>,
) {
    let schema = resolve_ref(root, schema);

    if let Some(members) = schema.get("allOf").and_then(Value::as_array) {
        for member in members {
            match member.get("$ref").and_then(Value::as_str) {
                Some(reference) if expanding.iter().any(|r| r == reference) => continue,
                Some(reference) => {
                    expanding.push(reference.to_string());
                    collect_properties(root, member, expanding, properties, required);
                    expanding.pop();
                }
                None => collect_properties(root, member, expanding, properties, required),
            }
        }
    }
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            properties.insert(name.clone(), prop.clone());
        }
    }
    if let Some(names) = schema.get("required").and_then(Value::as_array) {
        required.extend(names.iter().filter_map(Value::as_str).map(str::to_owned));
    }
}

fn scalar_facets(schema: &Value, typ: &str) -> String {
    let mut related = vec![typ.to_string()];

    if let Some(format) = schema.get("format").and_then(Value::as_str) {
        related.push(format!("format:{format}"));
    }
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        let values: Vec<String> = values.iter().map(plain).collect();
        related.push(format!("enum:{}", values.join(",")));
    }
    for (key, label) in [
        ("minimum", "min"),
        ("maximum", "max"),
        ("minLength", "minLen"),
        ("maxLength", "maxLen"),
        ("pattern", "pattern"),
        ("default", "default"),
    ] {
        if let Some(v) = schema.get(key) {
            related.push(format!("{label}:{}", plain(v)));
        }
    }

    related.join(" ")
}

/// Scalars without JSON quoting, everything else as compact JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
