//! Pre-seeded stores and document builders for tests.

use serde_json::json;

use loam_core::StoredObject;
use loam_store::{MemoryStore, ObjectStore};

/// A minimal entry with a URL and a name.
pub fn entry(url: &str, name: &str) -> StoredObject {
    let value = json!({
        "type": ["h-entry"],
        "properties": {"url": [url], "name": [name]},
        "acl": ["*"]
    });
    match StoredObject::from_value(value) {
        Ok(object) => object,
        Err(_) => unreachable!("fixture documents are well-formed"),
    }
}

/// An entry with a published timestamp (RFC 3339).
pub fn entry_at(url: &str, name: &str, published: &str) -> StoredObject {
    let value = json!({
        "type": ["h-entry"],
        "properties": {"url": [url], "name": [name], "published": [published]},
        "acl": ["*"]
    });
    match StoredObject::from_value(value) {
        Ok(object) => object,
        Err(_) => unreachable!("fixture documents are well-formed"),
    }
}

/// An in-memory store with helpers for the common test topologies.
pub struct TestFixture {
    pub store: MemoryStore,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
        }
    }

    /// Seed a batch of objects, discarding the outcomes.
    pub async fn seed(&self, objects: &[StoredObject]) {
        if let Err(e) = self.store.upsert_batch(objects).await {
            panic!("seeding fixture store: {e}");
        }
    }

    /// Seed the three-entry reference chain `http://1 -> http://2 -> http://3`:
    /// entry 1 references 2 under `comment`, and 2 references 3.
    ///
    /// Resolving entry 1 unbounded embeds all three levels; resolving with
    /// a small depth budget leaves the deeper references as bare URLs.
    pub async fn seed_thread(&self) {
        let objects = [
            object(json!({
                "type": ["h-entry"],
                "properties": {"url": ["http://1"], "name": ["one"], "comment": ["http://2"]},
                "acl": ["*"]
            })),
            object(json!({
                "type": ["h-entry"],
                "properties": {"url": ["http://2"], "name": ["two"], "comment": ["http://3"]},
                "acl": ["*"]
            })),
            object(json!({
                "type": ["h-entry"],
                "properties": {"url": ["http://3"], "name": ["three"]},
                "acl": ["*"]
            })),
        ];
        self.seed(&objects).await;
    }

    /// Seed a dynamic feed at `{prefix}feed` plus `count` dated entries
    /// directly under `prefix`, one day apart, oldest first.
    pub async fn seed_feed(&self, prefix: &str, count: u32) {
        let feed = object(json!({
            "type": ["h-x-dynamic-feed"],
            "properties": {"url": [format!("{prefix}feed")], "name": ["All posts"]},
            "acl": ["*"]
        }));
        self.seed(&[feed]).await;

        for day in 1..=count {
            let published = format!("2024-03-{day:02}T12:00:00Z");
            let url = format!("{prefix}{day}");
            self.seed(&[entry_at(&url, &format!("post {day}"), &published)])
                .await;
        }
    }

    /// Seed a reader channel subscribed to one inline feed listing the
    /// given entry URLs.
    pub async fn seed_channel(&self, channel_url: &str, entry_urls: &[&str]) {
        let channel = object(json!({
            "type": ["h-x-reader-channel"],
            "properties": {
                "url": [channel_url],
                "name": ["Reading"],
                "subscriptions": [{"entries": entry_urls}]
            },
            "acl": ["*"]
        }));
        self.seed(&[channel]).await;
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn object(value: serde_json::Value) -> StoredObject {
    match StoredObject::from_value(value) {
        Ok(object) => object,
        Err(_) => unreachable!("fixture documents are well-formed"),
    }
}
