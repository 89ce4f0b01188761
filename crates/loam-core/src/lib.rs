//! # Loam Core
//!
//! Core data model for the loam document store: the [`StoredObject`] record,
//! ACL visibility checks, timestamp parsing, and JSON helpers shared by the
//! graph and fetch layers.
//!
//! ## Key Types
//!
//! - [`StoredObject`] - The atomic unit of storage (a Microformats2-style object)
//! - [`ObjectKind`] - Classification by the first `type` tag
//! - [`is_visible`] - ACL membership evaluation
//! - [`parse_timestamp`] - Lenient timestamp parsing (unparseable = `None`)

pub mod acl;
pub mod error;
pub mod json;
pub mod object;
pub mod time;

pub use acl::{is_visible, PUBLIC};
pub use error::{ObjectError, Result};
pub use json::{collect_urls, contains, is_absolute_url, string_leaves};
pub use object::{ObjectKind, StoredObject, DYNAMIC_FEED_TYPE, READER_CHANNEL_TYPE};
pub use time::parse_timestamp;
