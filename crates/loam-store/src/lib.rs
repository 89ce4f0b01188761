//! # Loam Store
//!
//! Storage abstraction for the loam document store. Provides a trait-based
//! interface for object persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store module abstracts object storage behind the [`ObjectStore`]
//! trait, keyed by canonical URL. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for tests.
//!
//! ## Key Types
//!
//! - [`ObjectStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`UpsertOutcome`] - Per-record result of a batch upsert
//!
//! ## Design Notes
//!
//! - **Replace-on-conflict**: Upserting an existing URL replaces the whole
//!   record; later write wins, never an error.
//! - **Atomic batches**: All records derived from one input document are
//!   written together or not at all.
//! - **Tombstones**: Deletion marks the record, keeping the URL reserved and
//!   the properties in place.
//! - **Prefix scans include tombstones**: pagination needs them for boundary
//!   computation; callers filter them from result sets.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ObjectStore, UpsertOp, UpsertOutcome};
