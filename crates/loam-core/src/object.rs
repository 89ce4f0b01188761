//! The stored object: the atomic unit of storage.
//!
//! Objects follow the Microformats2 JSON shape: a non-empty `type` tag list,
//! a `properties` map whose values are (by convention) arrays, and optional
//! nested `children`. Loam adds an `acl` token list and a `deleted` tombstone
//! flag. The canonical key is `properties.url[0]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ObjectError, Result};
use crate::time::parse_timestamp;

/// First type tag marking a dynamic (rule-filtered) feed.
pub const DYNAMIC_FEED_TYPE: &str = "h-x-dynamic-feed";

/// First type tag marking a reader channel (subscription aggregation).
pub const READER_CHANNEL_TYPE: &str = "h-x-reader-channel";

/// Classification of a stored object by its first type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A plain entry (note, article, anything without special meaning).
    Entry,
    /// A virtual feed whose members are computed per-request from a URL
    /// prefix and filter predicates.
    DynamicFeed,
    /// An aggregation over the entry lists of subscribed feeds.
    ReaderChannel,
}

/// A stored object, keyed by `properties.url[0]`.
///
/// Whole-document replace semantics on write: an upsert replaces the entire
/// record, never patches individual fields. Deletion is a tombstone
/// (`deleted = true`, properties retained) so permalinks and pagination
/// ordering stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Ordered type tags, e.g. `["h-entry"]`. Never empty.
    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// Property map. Values are usually arrays (mf2 convention: every
    /// property is multi-valued; singular access means "first element").
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Nested sub-objects, or bare URL references after normalization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Value>,

    /// Principal tokens. `"*"` is public; other tokens are URL prefixes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acl: Vec<String>,

    /// Tombstone flag. The URL stays reserved; tombstones shape pagination
    /// boundaries but never appear in result sets.
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl StoredObject {
    /// Create an object with the given type tags and empty everything else.
    pub fn new(types: Vec<String>) -> Self {
        Self {
            types,
            properties: Map::new(),
            children: Vec::new(),
            acl: Vec::new(),
            deleted: false,
        }
    }

    /// Interpret a JSON value as a stored object.
    ///
    /// The value must be an object with a non-empty `type` array. Unknown
    /// keys are ignored.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ObjectError::NotAnObject);
        }
        let object: StoredObject = serde_json::from_value(value)?;
        if object.types.is_empty() {
            return Err(ObjectError::MissingTypes);
        }
        Ok(object)
    }

    /// Rebuild the full JSON form, including `acl` and `deleted`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "type".into(),
            Value::Array(self.types.iter().map(|t| Value::String(t.clone())).collect()),
        );
        map.insert("properties".into(), Value::Object(self.properties.clone()));
        if !self.children.is_empty() {
            map.insert("children".into(), Value::Array(self.children.clone()));
        }
        if !self.acl.is_empty() {
            map.insert(
                "acl".into(),
                Value::Array(self.acl.iter().map(|t| Value::String(t.clone())).collect()),
            );
        }
        if self.deleted {
            map.insert("deleted".into(), Value::Bool(true));
        }
        Value::Object(map)
    }

    /// The client-facing JSON form: `type`, `properties`, `children`.
    ///
    /// ACL tokens and the tombstone flag are storage concerns and are not
    /// echoed to clients.
    pub fn client_view(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "type".into(),
            Value::Array(self.types.iter().map(|t| Value::String(t.clone())).collect()),
        );
        map.insert("properties".into(), Value::Object(self.properties.clone()));
        if !self.children.is_empty() {
            map.insert("children".into(), Value::Array(self.children.clone()));
        }
        Value::Object(map)
    }

    /// First element of a property, treating non-array values as singular.
    pub fn first_prop(&self, name: &str) -> Option<&Value> {
        match self.properties.get(name)? {
            Value::Array(items) => items.first(),
            other => Some(other),
        }
    }

    /// First element of a property as a string.
    pub fn first_str(&self, name: &str) -> Option<&str> {
        self.first_prop(name)?.as_str()
    }

    /// The canonical key: `properties.url[0]`.
    pub fn url(&self) -> Option<&str> {
        self.first_str("url")
    }

    /// Parsed `published` timestamp; unparseable or absent is `None`.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.first_str("published")?)
    }

    /// Classify by the first type tag.
    pub fn kind(&self) -> ObjectKind {
        match self.types.first().map(String::as_str) {
            Some(DYNAMIC_FEED_TYPE) => ObjectKind::DynamicFeed,
            Some(READER_CHANNEL_TYPE) => ObjectKind::ReaderChannel,
            _ => ObjectKind::Entry,
        }
    }
}
