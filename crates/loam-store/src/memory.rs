//! In-memory implementation of the ObjectStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite but
//! keeps everything in a BTreeMap with no persistence. The BTreeMap gives
//! prefix scans a stable URL order for free.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use loam_core::{contains, StoredObject};

use crate::error::{Result, StoreError};
use crate::traits::{ObjectStore, UpsertOp, UpsertOutcome};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of records, tombstones included.
    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the store holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite the canonical URL properties and ACL tokens of an object moving
/// from the `old` prefix to `new`.
pub(crate) fn rewrite_prefixes(object: &mut StoredObject, old: &str, new: &str) {
    if let Some(Value::Array(urls)) = object.properties.get_mut("url") {
        for url in urls.iter_mut() {
            if let Value::String(s) = url {
                if let Some(rest) = s.strip_prefix(old) {
                    *s = format!("{new}{rest}");
                }
            }
        }
    }
    for token in object.acl.iter_mut() {
        if let Some(rest) = token.strip_prefix(old) {
            *token = format!("{new}{rest}");
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_by_url(&self, url: &str) -> Result<Option<StoredObject>> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(objects.get(url).cloned())
    }

    async fn get_by_url_prefix(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(objects
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(url, _)| url.starts_with(prefix))
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn query_by_property_containment(
        &self,
        predicates: &[Value],
    ) -> Result<Vec<StoredObject>> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(objects
            .values()
            .filter(|object| !object.deleted)
            .filter(|object| {
                let properties = Value::Object(object.properties.clone());
                predicates.iter().any(|p| contains(&properties, p))
            })
            .cloned()
            .collect())
    }

    async fn upsert_batch(&self, records: &[StoredObject]) -> Result<Vec<UpsertOutcome>> {
        // Validate the whole batch before touching the map, so a bad record
        // aborts with nothing written.
        let mut keyed = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let url = record.url().ok_or(StoreError::MissingUrl(index))?;
            keyed.push((url.to_string(), record.clone()));
        }

        let mut objects = self
            .objects
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut outcomes = Vec::with_capacity(keyed.len());
        for (url, record) in keyed {
            let op = if objects.insert(url.clone(), record).is_some() {
                UpsertOp::Updated
            } else {
                UpsertOp::Inserted
            };
            outcomes.push(UpsertOutcome { url, op });
        }
        Ok(outcomes)
    }

    async fn tombstone(&self, url: &str) -> Result<bool> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match objects.get_mut(url) {
            Some(object) => {
                object.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rename_url_prefix(&self, old: &str, new: &str) -> Result<u64> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let moving: Vec<String> = objects
            .range::<str, _>((Bound::Included(old), Bound::Unbounded))
            .take_while(|(url, _)| url.starts_with(old))
            .map(|(url, _)| url.clone())
            .collect();

        let mut count = 0;
        for url in moving {
            if let Some(mut object) = objects.remove(&url) {
                rewrite_prefixes(&mut object, old, new);
                let rest = url.strip_prefix(old).unwrap_or(&url);
                objects.insert(format!("{new}{rest}"), object);
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(url: &str) -> StoredObject {
        let mut object = StoredObject::new(vec!["h-entry".into()]);
        object.properties.insert("url".into(), json!([url]));
        object
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = MemoryStore::new();
        let outcomes = store
            .upsert_batch(&[entry("https://a.example/1")])
            .await
            .unwrap();
        assert_eq!(outcomes[0].op, UpsertOp::Inserted);

        let object = store.get_by_url("https://a.example/1").await.unwrap().unwrap();
        assert_eq!(object.url(), Some("https://a.example/1"));
    }

    #[tokio::test]
    async fn test_replace_on_conflict() {
        let store = MemoryStore::new();
        let mut first = entry("https://a.example/1");
        first.properties.insert("name".into(), json!(["first"]));
        let mut second = entry("https://a.example/1");
        second.properties.insert("name".into(), json!(["second"]));

        store.upsert_batch(&[first]).await.unwrap();
        let outcomes = store.upsert_batch(&[second]).await.unwrap();
        assert_eq!(outcomes[0].op, UpsertOp::Updated);

        let object = store.get_by_url("https://a.example/1").await.unwrap().unwrap();
        assert_eq!(object.first_str("name"), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_aborts_on_missing_url() {
        let store = MemoryStore::new();
        let no_url = StoredObject::new(vec!["h-entry".into()]);
        let err = store
            .upsert_batch(&[entry("https://a.example/1"), no_url])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingUrl(1)));
        // Nothing from the batch landed
        assert!(store.get_by_url("https://a.example/1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prefix_scan_includes_tombstones() {
        let store = MemoryStore::new();
        store
            .upsert_batch(&[
                entry("https://a.example/1"),
                entry("https://a.example/2"),
                entry("https://b.example/1"),
            ])
            .await
            .unwrap();
        assert!(store.tombstone("https://a.example/2").await.unwrap());

        let scanned = store.get_by_url_prefix("https://a.example/").await.unwrap();
        assert_eq!(scanned.len(), 2);
        assert!(scanned.iter().any(|o| o.deleted));
    }

    #[tokio::test]
    async fn test_containment_query() {
        let store = MemoryStore::new();
        let mut tagged = entry("https://a.example/1");
        tagged.properties.insert("category".into(), json!(["rust", "indieweb"]));
        store.upsert_batch(&[tagged, entry("https://a.example/2")]).await.unwrap();

        let hits = store
            .query_by_property_containment(&[json!({"category": ["rust"]})])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url(), Some("https://a.example/1"));
    }

    #[tokio::test]
    async fn test_rename_url_prefix() {
        let store = MemoryStore::new();
        let mut object = entry("https://old.example/post/1");
        object.acl.push("https://old.example/".into());
        store.upsert_batch(&[object]).await.unwrap();

        let count = store
            .rename_url_prefix("https://old.example/", "https://new.example/")
            .await
            .unwrap();
        assert_eq!(count, 1);

        assert!(store.get_by_url("https://old.example/post/1").await.unwrap().is_none());
        let moved = store
            .get_by_url("https://new.example/post/1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.url(), Some("https://new.example/post/1"));
        assert_eq!(moved.acl[0], "https://new.example/");
    }

    #[tokio::test]
    async fn test_tombstone_missing_url() {
        let store = MemoryStore::new();
        assert!(!store.tombstone("https://a.example/nope").await.unwrap());
    }
}
