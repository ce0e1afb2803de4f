//! Key lookup in nested JSON documents.

use serde_json::Value;

/// Default nesting limit for [`find_first`].
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Finds the first value stored under `key` anywhere in `value`.
///
/// Objects are checked for `key` before their children are searched; children
/// are visited in document order, arrays element by element. Only values
/// accepted by `accept` count as a match, so a `null` or mistyped value does
/// not hide a later match. Nesting deeper than `max_depth` is not searched.
pub fn find_first<'a>(
    value: &'a Value,
    key: &str,
    max_depth: usize,
    accept: &dyn Fn(&Value) -> bool,
) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if let Some(found) = map.get(key).filter(|v| accept(v)) {
                return Some(found);
            }
            if max_depth == 0 {
                return None;
            }
            map.values()
                .find_map(|child| find_first(child, key, max_depth - 1, accept))
        }
        Value::Array(items) if max_depth > 0 => items
            .iter()
            .find_map(|child| find_first(child, key, max_depth - 1, accept)),
        _ => None,
    }
}

/// Finds the first string stored under `key` anywhere in `value`.
pub fn find_first_str<'a>(value: &'a Value, key: &str, max_depth: usize) -> Option<&'a str> {
    find_first(value, key, max_depth, &Value::is_string).and_then(Value::as_str)
}
