//! Flattening an embedded document tree into independent stored records.
//!
//! A client submits one document that may embed other addressable objects
//! (a post carrying its comments inline, a feed carrying its definition).
//! Normalization extracts every embedded object that has its own canonical
//! URL into a record of its own, replacing it in the parent with a bare URL
//! reference. The result is the flat record list the store's batch upsert
//! consumes.

use serde_json::{Map, Value};

use loam_core::StoredObject;

/// Flatten `doc` into independent records.
///
/// Walks the document depth-first. Any sub-object shaped like
/// `{type, properties, ...}` whose `properties.url[0]` is present is
/// extracted: its own properties and children are normalized first (so
/// nested embeds are extracted before their container), the record is
/// appended to the output, and the sub-object is replaced in its parent by
/// its URL string. Values under `url`/`uid` keys are never descended into.
/// A candidate without `properties.url[0]` cannot become addressable, so it
/// stays embedded with its children normalized in place.
///
/// The top-level document is always the last record, reflecting its already
/// flattened content. If the same URL was embedded more than once the batch
/// upsert resolves it last-wins in this emission order; callers must not
/// rely on which literal embedding wins.
pub fn normalize(doc: &StoredObject) -> Vec<StoredObject> {
    let mut records = Vec::new();

    let mut root = doc.clone();
    root.properties = walk_map(&doc.properties, &mut records);
    root.children = doc
        .children
        .iter()
        .map(|child| walk(child, &mut records))
        .collect();

    records.push(root);
    records
}

/// Normalize every value of a property map, leaving `url`/`uid` untouched.
fn walk_map(map: &Map<String, Value>, records: &mut Vec<StoredObject>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            // Identifier arrays must not be mistaken for embedded objects.
            if key == "url" || key == "uid" {
                (key.clone(), value.clone())
            } else {
                (key.clone(), walk(value, records))
            }
        })
        .collect()
}

fn walk(value: &Value, records: &mut Vec<StoredObject>) -> Value {
    match value {
        Value::Object(map) => {
            let rebuilt = walk_map(map, records);
            match extract(&rebuilt) {
                Some((url, record)) => {
                    records.push(record);
                    Value::String(url)
                }
                None => Value::Object(rebuilt),
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| walk(v, records)).collect()),
        other => other.clone(),
    }
}

/// Try to turn an (already normalized) object map into an addressable record.
fn extract(map: &Map<String, Value>) -> Option<(String, StoredObject)> {
    if !map.contains_key("type") || !map.contains_key("properties") {
        return None;
    }
    let url = embedded_url(map)?;
    // A fragment with the right keys but the wrong shapes is opaque data,
    // not an error.
    let record = StoredObject::from_value(Value::Object(map.clone())).ok()?;
    Some((url, record))
}

/// `properties.url[0]` of a candidate object map, when it is a string.
fn embedded_url(map: &Map<String, Value>) -> Option<String> {
    let url = match map.get("properties")?.get("url")? {
        Value::Array(items) => items.first()?,
        other => other,
    };
    url.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> StoredObject {
        StoredObject::from_value(value).unwrap()
    }

    #[test]
    fn test_plain_entry_is_single_record() {
        let entry = doc(json!({
            "type": ["h-entry"],
            "properties": {"url": ["https://a.example/1"], "content": ["hello"]}
        }));
        let records = normalize(&entry);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], entry);
    }

    #[test]
    fn test_embedded_comment_is_extracted() {
        let entry = doc(json!({
            "type": ["h-entry"],
            "properties": {
                "url": ["https://a.example/post"],
                "comment": [{
                    "type": ["h-cite"],
                    "properties": {"url": ["https://b.example/reply"], "content": ["nice"]}
                }]
            }
        }));

        let records = normalize(&entry);
        assert_eq!(records.len(), 2);

        // Extracted comment first, container last
        assert_eq!(records[0].url(), Some("https://b.example/reply"));
        assert_eq!(records[1].url(), Some("https://a.example/post"));

        // The container now references the comment by URL
        assert_eq!(
            records[1].properties["comment"],
            json!(["https://b.example/reply"])
        );
    }

    #[test]
    fn test_nested_embeds_extracted_innermost_first() {
        let entry = doc(json!({
            "type": ["h-entry"],
            "properties": {
                "url": ["https://a.example/1"],
                "comment": [{
                    "type": ["h-cite"],
                    "properties": {
                        "url": ["https://a.example/2"],
                        "comment": [{
                            "type": ["h-cite"],
                            "properties": {"url": ["https://a.example/3"]}
                        }]
                    }
                }]
            }
        }));

        let records = normalize(&entry);
        let urls: Vec<_> = records.iter().map(|r| r.url().unwrap()).collect();
        assert_eq!(
            urls,
            vec!["https://a.example/3", "https://a.example/2", "https://a.example/1"]
        );
        // The middle record references the innermost, already flattened
        assert_eq!(records[1].properties["comment"], json!(["https://a.example/3"]));
    }

    #[test]
    fn test_candidate_without_url_stays_embedded() {
        let entry = doc(json!({
            "type": ["h-entry"],
            "properties": {
                "url": ["https://a.example/1"],
                "author": [{
                    "type": ["h-card"],
                    "properties": {
                        "name": ["Anon"],
                        "org": [{
                            "type": ["h-card"],
                            "properties": {"url": ["https://org.example/"], "name": ["Org"]}
                        }]
                    }
                }]
            }
        }));

        let records = normalize(&entry);
        assert_eq!(records.len(), 2);
        // The org inside the anonymous card was still extracted
        assert_eq!(records[0].url(), Some("https://org.example/"));
        // The card itself stays embedded, now referencing the org
        let author = &records[1].properties["author"][0];
        assert_eq!(author["properties"]["org"], json!(["https://org.example/"]));
    }

    #[test]
    fn test_url_and_uid_keys_not_descended() {
        // A url array whose extra elements look like embeddable objects must
        // be carried verbatim.
        let entry = doc(json!({
            "type": ["h-entry"],
            "properties": {
                "url": ["https://a.example/1", {
                    "type": ["h-entry"],
                    "properties": {"url": ["https://trap.example/"]}
                }],
                "uid": [{"type": ["h-entry"], "properties": {"url": ["https://trap2.example/"]}}]
            }
        }));

        let records = normalize(&entry);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], entry);
    }

    #[test]
    fn test_children_are_normalized() {
        let feed = doc(json!({
            "type": ["h-feed"],
            "properties": {"url": ["https://a.example/feed"]},
            "children": [
                {"type": ["h-entry"], "properties": {"url": ["https://a.example/1"]}},
                {"type": ["h-entry"], "properties": {"name": ["no url, stays"]}}
            ]
        }));

        let records = normalize(&feed);
        assert_eq!(records.len(), 2);
        let root = &records[1];
        assert_eq!(root.children[0], json!("https://a.example/1"));
        assert!(root.children[1].is_object());
    }

    #[test]
    fn test_duplicate_embedding_emits_both() {
        let entry = doc(json!({
            "type": ["h-entry"],
            "properties": {
                "url": ["https://a.example/1"],
                "like": [{"type": ["h-cite"], "properties": {"url": ["https://dup.example/"], "n": ["a"]}}],
                "repost": [{"type": ["h-cite"], "properties": {"url": ["https://dup.example/"], "n": ["b"]}}]
            }
        }));

        let records = normalize(&entry);
        // Both embeddings are emitted; batch upsert resolves last-wins
        assert_eq!(records.len(), 3);
        let dups: Vec<_> = records
            .iter()
            .filter(|r| r.url() == Some("https://dup.example/"))
            .collect();
        assert_eq!(dups.len(), 2);
    }
}
