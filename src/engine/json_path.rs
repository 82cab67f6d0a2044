//! JSON value selection by dot path or JSON pointer
//!
//! A `*` segment expands every element of an array, so one path can select
//! many values. Each selected value is paired with its concrete pointer.

use serde_json::Value;

/// Convert a dot path (`body.items.0.id`) to a JSON pointer
///
/// Paths containing `/` are taken as pointers already.
pub(crate) fn to_pointer(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }
    let pointer = if path.contains('/') {
        path.to_string()
    } else {
        path.replace('.', "/")
    };
    if pointer.starts_with('/') {
        pointer
    } else {
        format!("/{}", pointer)
    }
}

/// Every value `path` selects in `document`, in document order
///
/// Segments that do not resolve drop that branch, so an empty result means
/// nothing matched.
pub fn select<'a>(document: &'a Value, path: &str) -> Vec<(String, &'a Value)> {
    let pointer = to_pointer(path);
    let mut nodes = vec![(String::new(), document)];

    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        nodes = nodes
            .into_iter()
            .flat_map(|(at, node)| children(&at, node, segment))
            .collect();
    }

    for (at, _) in nodes.iter_mut() {
        if at.is_empty() {
            at.push('/');
        }
    }
    nodes
}

fn children<'a>(at: &str, node: &'a Value, segment: &str) -> Vec<(String, &'a Value)> {
    match node {
        Value::Array(items) if segment == "*" => items
            .iter()
            .enumerate()
            .map(|(i, item)| (format!("{}/{}", at, i), item))
            .collect(),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .map(|item| (format!("{}/{}", at, segment), item))
            .into_iter()
            .collect(),
        Value::Object(map) => {
            let key = segment.replace("~1", "/").replace("~0", "~");
            map.get(&key)
                .map(|value| (format!("{}/{}", at, segment), value))
                .into_iter()
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Textual form of a selected value; strings lose their quotes
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
