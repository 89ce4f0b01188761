//! JSON helpers shared by the graph, fetch, and indexing layers.

use serde_json::Value;
use std::collections::BTreeSet;

/// Whether a string is plausibly an absolute URL into the store.
///
/// Bare strings matching this shape anywhere in properties or children are
/// *potential* links, resolved lazily; they are never eagerly validated.
pub fn is_absolute_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Collect every absolute-URL-shaped string leaf in `value` into `out`.
///
/// Strings under `url`/`uid` keys are skipped: those name the object itself,
/// not an outgoing reference.
pub fn collect_urls(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            if is_absolute_url(s) {
                out.insert(s.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_urls(item, out);
            }
        }
        Value::Object(map) => {
            for (key, inner) in map {
                if key == "url" || key == "uid" {
                    continue;
                }
                collect_urls(inner, out);
            }
        }
        _ => {}
    }
}

/// Structural containment, JSONB `@>` style.
///
/// An object contains another when every key of the needle is present with a
/// contained value. An array contains another array when every needle element
/// is contained by some haystack element, and contains a scalar when some
/// element equals it. Scalars contain only their equals.
///
/// This is the predicate semantics behind feed `filter`/`unfilter` lists and
/// the store's property-containment queries.
pub fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Object(hay), Value::Object(need)) => need
            .iter()
            .all(|(key, value)| hay.get(key).is_some_and(|h| contains(h, value))),
        (Value::Array(hay), Value::Array(need)) => need
            .iter()
            .all(|value| hay.iter().any(|h| contains(h, value))),
        (Value::Array(hay), scalar) => hay.iter().any(|h| h == scalar),
        (a, b) => a == b,
    }
}

/// Flatten a JSON value to its string leaves, in document order.
///
/// Used by the text indexer to turn nested property values into indexable
/// text.
pub fn string_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => {
            for item in items {
                string_leaves(item, out);
            }
        }
        Value::Object(map) => {
            for inner in map.values() {
                string_leaves(inner, out);
            }
        }
        _ => {}
    }
}
