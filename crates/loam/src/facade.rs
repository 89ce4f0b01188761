//! The loam facade: one handle owning the store, the change bus, and the
//! text index, exposing the whole write/read lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use loam_core::StoredObject;
use loam_graph::{normalize, Denormalizer};
use loam_index::{extract_text, ChangeEvent, ChangeOp, Notifier, NullNotifier, NullTextIndex, TextIndex};
use loam_store::{ObjectStore, UpsertOp, UpsertOutcome};

use crate::config::LoamConfig;
use crate::error::Result;
use crate::fetch::{FetchRequest, Fetcher};

/// A document store for linked content objects.
///
/// Writes normalize the submitted document into flat records and upsert
/// them atomically; reads assemble client-ready documents back out of the
/// flat records. Change notifications and text indexing ride along on the
/// write path, after the store commit.
pub struct Loam<S: ObjectStore> {
    store: Arc<S>,
    config: LoamConfig,
    notifier: Arc<dyn Notifier>,
    text_index: Arc<dyn TextIndex>,
}

impl<S: ObjectStore> Loam<S> {
    /// Create a facade with default configuration and no notification or
    /// search wiring.
    pub fn new(store: S) -> Self {
        Self::with_config(store, LoamConfig::default())
    }

    pub fn with_config(store: S, config: LoamConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
            notifier: Arc::new(NullNotifier),
            text_index: Arc::new(NullTextIndex),
        }
    }

    /// Wire up a change-notification bus.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Wire up a full-text index.
    pub fn with_text_index(mut self, text_index: Arc<dyn TextIndex>) -> Self {
        self.text_index = text_index;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LoamConfig {
        &self.config
    }

    /// Store a document.
    ///
    /// The document is normalized into flat records; records carrying a
    /// canonical URL are upserted in one atomic batch, then each commit is
    /// announced on the change bus and re-indexed. Embedded objects without
    /// a URL stay inline in their parent and are not stored separately.
    pub async fn put(&self, document: &StoredObject) -> Result<Vec<UpsertOutcome>> {
        let records: Vec<StoredObject> = normalize(document)
            .into_iter()
            .filter(|r| r.url().is_some())
            .collect();
        debug!(records = records.len(), "storing document");

        let outcomes = self.store.upsert_batch(&records).await?;

        for (record, outcome) in records.iter().zip(&outcomes) {
            let op = match outcome.op {
                UpsertOp::Inserted => ChangeOp::Insert,
                UpsertOp::Updated => ChangeOp::Update,
            };
            self.notifier
                .publish(ChangeEvent {
                    op,
                    url: outcome.url.clone(),
                })
                .await?;
            self.text_index
                .index(&outcome.url, &extract_text(record))
                .await?;
        }

        Ok(outcomes)
    }

    /// Parse a JSON document and store it.
    pub async fn put_json(&self, input: &str) -> Result<Vec<UpsertOutcome>> {
        let value: Value = serde_json::from_str(input)?;
        let document = StoredObject::from_value(value)?;
        self.put(&document).await
    }

    /// Parse a YAML document and store it.
    ///
    /// YAML is accepted as an authoring convenience only; it is converted
    /// to the JSON data model before anything else happens.
    pub async fn put_yaml(&self, input: &str) -> Result<Vec<UpsertOutcome>> {
        let value: Value = serde_yaml::from_str(input)?;
        let document = StoredObject::from_value(value)?;
        self.put(&document).await
    }

    /// Assemble the client-ready document for a request.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Option<Value>> {
        Fetcher::new(self.store.as_ref(), &self.config)
            .fetch(request)
            .await
    }

    /// Tombstone the object at a URL.
    ///
    /// Returns whether a live object was deleted. The tombstone keeps the
    /// record's timestamps so pagination boundaries stay stable.
    pub async fn delete(&self, url: &str) -> Result<bool> {
        let deleted = self.store.tombstone(url).await?;
        if deleted {
            info!(url, "tombstoned object");
            self.notifier
                .publish(ChangeEvent {
                    op: ChangeOp::Delete,
                    url: url.to_string(),
                })
                .await?;
            self.text_index.remove(url).await?;
        }
        Ok(deleted)
    }

    /// Rewrite every stored URL under `old_prefix` to live under
    /// `new_prefix`, returning the number of records moved.
    pub async fn rename_url_prefix(&self, old_prefix: &str, new_prefix: &str) -> Result<u64> {
        let moved = self.store.rename_url_prefix(old_prefix, new_prefix).await?;
        info!(old_prefix, new_prefix, moved, "renamed url prefix");
        Ok(moved)
    }

    /// Resolve references in a value, bounded by the configured depth.
    pub async fn denormalize(&self, value: &Value) -> Result<Value> {
        let resolved = Denormalizer::new(self.store.as_ref())
            .denormalize(value, self.config.denormalize_depth_limit)
            .await?;
        Ok(resolved)
    }

    /// Resolve references with no depth bound. Cycle-safe, but prefer the
    /// bounded form for anything user-facing.
    pub async fn denormalize_unlimited(&self, value: &Value) -> Result<Value> {
        let resolved = Denormalizer::new(self.store.as_ref())
            .denormalize_unlimited(value)
            .await?;
        Ok(resolved)
    }

    /// Fetch with only a URL and principal; a convenience for callers
    /// without pagination or filter parameters.
    pub async fn fetch_url(&self, url: &str, principal: &str) -> Result<Option<Value>> {
        let request = FetchRequest {
            url: url.to_string(),
            principal: principal.to_string(),
            params: HashMap::new(),
            ..FetchRequest::default()
        };
        self.fetch(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_index::{BroadcastNotifier, MemoryTextIndex, TextWeight};
    use loam_store::MemoryStore;
    use serde_json::json;

    fn entry(url: &str, name: &str) -> StoredObject {
        StoredObject::from_value(json!({
            "type": ["h-entry"],
            "properties": {"url": [url], "name": [name]}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_stores_normalized_records() {
        let loam = Loam::new(MemoryStore::new());
        let document = StoredObject::from_value(json!({
            "type": ["h-entry"],
            "properties": {
                "url": ["https://a.example/post"],
                "author": [{
                    "type": ["h-card"],
                    "properties": {"url": ["https://a.example/me"], "name": ["Ann"]}
                }]
            }
        }))
        .unwrap();

        let outcomes = loam.put(&document).await.unwrap();
        assert_eq!(outcomes.len(), 2);

        // The embedded card was extracted to its own record and the parent
        // keeps a reference
        let card = loam
            .store()
            .get_by_url("https://a.example/me")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(card.first_str("name"), Some("Ann"));

        let post = loam
            .store()
            .get_by_url("https://a.example/post")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.first_str("author"), Some("https://a.example/me"));
    }

    #[tokio::test]
    async fn test_put_yaml_round_trips() {
        let loam = Loam::new(MemoryStore::new());
        let yaml = r#"
type: [h-entry]
properties:
  url: ["https://a.example/yaml"]
  name: ["From YAML"]
"#;
        loam.put_yaml(yaml).await.unwrap();
        let stored = loam
            .store()
            .get_by_url("https://a.example/yaml")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.first_str("name"), Some("From YAML"));
    }

    #[tokio::test]
    async fn test_put_and_delete_emit_change_events() {
        let notifier = Arc::new(BroadcastNotifier::new(16));
        let mut rx = notifier.subscribe();
        let loam = Loam::new(MemoryStore::new()).with_notifier(notifier);

        loam.put(&entry("https://a.example/1", "one")).await.unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent { op: ChangeOp::Insert, url: "https://a.example/1".into() }
        );

        loam.put(&entry("https://a.example/1", "one again")).await.unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent { op: ChangeOp::Update, url: "https://a.example/1".into() }
        );

        assert!(loam.delete("https://a.example/1").await.unwrap());
        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent { op: ChangeOp::Delete, url: "https://a.example/1".into() }
        );

        // Deleting a tombstone is a no-op and emits nothing
        assert!(!loam.delete("https://a.example/1").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_feeds_text_index_and_delete_clears_it() {
        let index = Arc::new(MemoryTextIndex::new());
        let loam = Loam::new(MemoryStore::new()).with_text_index(index.clone());

        loam.put(&entry("https://a.example/1", "Indexed Title"))
            .await
            .unwrap();
        let fields = index.fields("https://a.example/1").unwrap();
        assert_eq!(fields[0].weight, TextWeight::A);
        assert_eq!(fields[0].text, "Indexed Title");

        loam.delete("https://a.example/1").await.unwrap();
        assert!(index.fields("https://a.example/1").is_none());
    }

    #[tokio::test]
    async fn test_fetch_of_missing_or_deleted_is_none() {
        let loam = Loam::new(MemoryStore::new());
        assert!(loam
            .fetch_url("https://a.example/nope", "")
            .await
            .unwrap()
            .is_none());

        loam.put(&entry("https://a.example/1", "one")).await.unwrap();
        loam.delete("https://a.example/1").await.unwrap();
        assert!(loam
            .fetch_url("https://a.example/1", "")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rename_url_prefix() {
        let loam = Loam::new(MemoryStore::new());
        loam.put(&entry("https://old.example/a", "a")).await.unwrap();
        loam.put(&entry("https://old.example/b", "b")).await.unwrap();

        let moved = loam
            .rename_url_prefix("https://old.example/", "https://new.example/")
            .await
            .unwrap();
        assert_eq!(moved, 2);
        assert!(loam
            .store()
            .get_by_url("https://new.example/a")
            .await
            .unwrap()
            .is_some());
        assert!(loam
            .store()
            .get_by_url("https://old.example/a")
            .await
            .unwrap()
            .is_none());
    }
}
