//! # Loam Index
//!
//! Downstream propagation for the loam document store: every write fans out
//! to a change-notification bus and a full-text index. Both are trait seams;
//! the in-process implementations here cover tests and single-node
//! deployments, and external transports (pub/sub, a search server) plug in
//! behind the same traits.
//!
//! ## Key Types
//!
//! - [`Notifier`] / [`BroadcastNotifier`] - change-event fan-out
//! - [`TextIndex`] / [`MemoryTextIndex`] - weighted text (re)indexing
//! - [`extract_text`] - weighted text extraction from object properties

pub mod error;
pub mod index;
pub mod notify;
pub mod text;

pub use error::{IndexError, Result};
pub use index::{MemoryTextIndex, NullTextIndex, TextIndex};
pub use notify::{BroadcastNotifier, ChangeEvent, ChangeOp, Notifier, NullNotifier};
pub use text::{extract_text, TextWeight, WeightedText};
