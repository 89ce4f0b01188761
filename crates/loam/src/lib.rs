//! # Loam
//!
//! A document store for linked Microformats2-style content objects.
//!
//! Documents are JSON objects with a `type` array, multi-valued
//! `properties`, and optional `children`, keyed by the first value of
//! `properties.url`. On write, embedded objects carrying their own URL are
//! extracted into independent records and replaced by bare URL references;
//! on read, references are resolved back into embedded trees with cycle and
//! depth safety, feed views are filtered, ACL-checked, and paginated by
//! timestamp cursors, and referenced objects ride along in a flat preload
//! map.
//!
//! ## Quick Start
//!
//! ```no_run
//! use loam::{FetchRequest, Loam};
//! use loam_store::MemoryStore;
//!
//! # async fn demo() -> loam::Result<()> {
//! let loam = Loam::new(MemoryStore::new());
//!
//! loam.put_json(r#"{
//!     "type": ["h-entry"],
//!     "properties": {"url": ["https://a.example/hello"], "name": ["Hello"]}
//! }"#)
//! .await?;
//!
//! let document = loam.fetch(&FetchRequest::new("https://a.example/hello")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - [`loam_core`] - the object model, ACL matching, JSON containment
//! - [`loam_graph`] - normalize / denormalize reference transforms
//! - [`loam_store`] - the [`ObjectStore`](loam_store::ObjectStore) trait,
//!   SQLite and in-memory backends
//! - [`loam_index`] - change notifications and weighted text indexing

pub mod config;
pub mod error;
pub mod facade;
pub mod fetch;
pub mod paginator;

pub use config::LoamConfig;
pub use error::{LoamError, Result};
pub use facade::Loam;
pub use fetch::{FetchRequest, Fetcher};
pub use paginator::Candidate;

pub use loam_core::StoredObject;
pub use loam_index::{ChangeEvent, ChangeOp};
pub use loam_store::{MemoryStore, SqliteStore, UpsertOp, UpsertOutcome};
