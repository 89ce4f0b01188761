//! ObjectStore trait: the abstract interface for object persistence.
//!
//! This trait keeps the graph and fetch layers storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use serde_json::Value;

use loam_core::StoredObject;

use crate::error::Result;

/// How an upserted record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOp {
    /// No record existed at this URL before.
    Inserted,
    /// An existing record was replaced.
    Updated,
}

/// Per-record result of a batch upsert, in write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// The canonical URL the record was written under.
    pub url: String,
    /// Whether the write was an insert or a replacement.
    pub op: UpsertOp,
}

/// The ObjectStore trait: async interface for object persistence.
///
/// All methods are async to support both sync (SQLite via `spawn_blocking`)
/// and async backends.
///
/// # Design Notes
///
/// - **Keyed by URL**: the canonical key is `properties.url[0]`.
/// - **Replace-on-conflict**: a duplicate URL in an upsert replaces the
///   existing record; never an error.
/// - **Tombstones survive scans**: `get_by_url` and `get_by_url_prefix`
///   return tombstoned records so pagination can use them as boundaries.
///   Callers exclude them from result sets.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Look up an object by its canonical URL.
    async fn get_by_url(&self, url: &str) -> Result<Option<StoredObject>>;

    /// All objects whose canonical URL starts with `prefix`, tombstones
    /// included, in stable URL order.
    async fn get_by_url_prefix(&self, prefix: &str) -> Result<Vec<StoredObject>>;

    /// All non-deleted objects whose properties contain at least one of the
    /// given predicates (JSONB-style structural containment).
    async fn query_by_property_containment(
        &self,
        predicates: &[Value],
    ) -> Result<Vec<StoredObject>>;

    /// Write or replace every record, atomically.
    ///
    /// Each record must carry a canonical URL; a record without one aborts
    /// the whole batch before anything is written. Duplicate URLs within the
    /// batch resolve last-wins in emission order.
    async fn upsert_batch(&self, records: &[StoredObject]) -> Result<Vec<UpsertOutcome>>;

    /// Tombstone an object: set `deleted`, retain properties, keep the URL
    /// reserved. Returns false if no record exists at the URL.
    async fn tombstone(&self, url: &str) -> Result<bool>;

    /// Maintenance operation: move every object under `old` to the same path
    /// under `new`, rewriting stored keys, `url` properties, and ACL prefix
    /// tokens. Returns the number of records rewritten.
    async fn rename_url_prefix(&self, old: &str, new: &str) -> Result<u64>;
}
