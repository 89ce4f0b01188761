//! Reconstituting embedded trees from flat records.
//!
//! Denormalization is the inverse of [`normalize`](crate::normalize): bare
//! URL strings are replaced by the full referenced object inline. Two modes
//! share one traversal rule set and differ only in termination policy:
//!
//! - **Bounded** ([`Denormalizer::denormalize`]): a depth budget counts
//!   object-hops below each replacement point; budget exhaustion guarantees
//!   termination even on unbounded reference chains, independent of the
//!   cycle guard.
//! - **Unbounded** ([`Denormalizer::denormalize_unlimited`]): relies solely
//!   on the visited-set cycle guard. Callers must prefer bounded mode
//!   unless the graph is known acyclic.
//!
//! The visited set is path-scoped: it prevents re-entering a URL along the
//! path that already passed through it, and nothing more. The same URL
//! reached via independent sibling paths expands at each site.
//!
//! An optional visibility gate ([`Denormalizer::with_visibility`]) keeps
//! objects the caller may not see from being embedded at all; their
//! references stay bare strings, indistinguishable from missing objects.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};

use loam_core::{is_absolute_url, StoredObject};
use loam_store::ObjectStore;

use crate::error::Result;

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

/// Resolves URL references against a store, embedding what it finds.
///
/// Each top-level call owns a fresh visited set; state is never shared or
/// reused across calls.
pub struct Denormalizer<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    visible: Option<Box<dyn Fn(&StoredObject) -> bool + Send + Sync + 'a>>,
}

impl<'a, S: ObjectStore + ?Sized> Denormalizer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            visible: None,
        }
    }

    /// Resolve with a visibility gate: an object failing the predicate is
    /// never embedded, its reference stays a bare string. This is how the
    /// fetch path keeps ACL-protected objects out of assembled documents.
    pub fn with_visibility<F>(store: &'a S, visible: F) -> Self
    where
        F: Fn(&StoredObject) -> bool + Send + Sync + 'a,
    {
        Self {
            store,
            visible: Some(Box::new(visible)),
        }
    }

    fn allowed(&self, object: &StoredObject) -> bool {
        match &self.visible {
            Some(visible) => visible(object),
            None => true,
        }
    }

    /// Resolve references in `value`, embedding at most `depth` object-hops
    /// below each replacement point.
    ///
    /// `depth = 0` leaves every reference as a bare string.
    pub async fn denormalize(&self, value: &Value, depth: u32) -> Result<Value> {
        let mut visited = HashSet::new();
        self.walk(value, &mut visited, Some(depth)).await
    }

    /// Resolve references in `value` with no depth bound.
    ///
    /// Terminates on cyclic graphs only because the per-path cycle guard
    /// cuts re-entrant references; a graph that keeps reaching *new* URLs
    /// never terminates. Prefer [`denormalize`](Self::denormalize).
    pub async fn denormalize_unlimited(&self, value: &Value) -> Result<Value> {
        let mut visited = HashSet::new();
        self.walk(value, &mut visited, None).await
    }

    /// One traversal step. `budget` is `None` in unbounded mode, otherwise
    /// the remaining object-hops.
    fn walk<'b>(
        &'b self,
        value: &'b Value,
        visited: &'b mut HashSet<String>,
        budget: Option<u32>,
    ) -> WalkFuture<'b> {
        Box::pin(async move {
            match value {
                Value::String(url) => self.resolve(url, visited, budget).await,
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.walk(item, &mut *visited, budget).await?);
                    }
                    Ok(Value::Array(out))
                }
                Value::Object(map) => self.walk_object(map, visited, budget).await,
                other => Ok(other.clone()),
            }
        })
    }

    /// Resolve one string: cycle guard, budget check, store lookup, expand.
    async fn resolve(
        &self,
        url: &str,
        visited: &mut HashSet<String>,
        budget: Option<u32>,
    ) -> Result<Value> {
        let unchanged = Value::String(url.to_string());

        // Cycle guard: re-entry along the current path stays a bare string.
        if visited.contains(url) {
            return Ok(unchanged);
        }
        if budget == Some(0) {
            return Ok(unchanged);
        }

        visited.insert(url.to_string());
        let found = self.store.get_by_url(url).await?;
        let result = match found {
            // Tombstoned and invisible objects resolve like missing ones:
            // the reference stays and nothing about them is disclosed.
            Some(object) if !object.deleted && self.allowed(&object) => {
                let inner = budget.map(|b| b - 1);
                Ok(self.expand(&object, visited, inner).await?)
            }
            _ => Ok(unchanged),
        };
        visited.remove(url);
        result
    }

    /// Embed a found object, resolving its own properties and children.
    async fn expand(
        &self,
        object: &StoredObject,
        visited: &mut HashSet<String>,
        budget: Option<u32>,
    ) -> Result<Value> {
        let properties = Value::Object(object.properties.clone());
        let properties = self.walk(&properties, &mut *visited, budget).await?;

        let mut map = Map::new();
        map.insert(
            "type".into(),
            Value::Array(object.types.iter().map(|t| Value::String(t.clone())).collect()),
        );
        map.insert("properties".into(), properties);
        if !object.children.is_empty() {
            let children = Value::Array(object.children.clone());
            map.insert(
                "children".into(),
                self.walk(&children, &mut *visited, budget).await?,
            );
        }
        Ok(Value::Object(map))
    }

    async fn walk_object(
        &self,
        map: &Map<String, Value>,
        visited: &mut HashSet<String>,
        budget: Option<u32>,
    ) -> Result<Value> {
        // Pre-register the object's own identity so a self-reference inside
        // it does not immediately re-expand it. Only registrations this
        // frame added are removed on the way out; the set stays path-scoped.
        let mut registered = Vec::new();
        for key in ["url", "uid"] {
            if let Some(value) = map.get(key) {
                for id in identity_strings(value) {
                    if visited.insert(id.clone()) {
                        registered.push(id);
                    }
                }
            }
        }

        let mut rebuilt = Map::new();
        for (key, value) in map {
            // Identifier values are copied verbatim, never treated as
            // references.
            if key == "url" || key == "uid" {
                rebuilt.insert(key.clone(), value.clone());
                continue;
            }
            // Performance short-circuit in bounded mode: a direct string
            // value that cannot be a store URL needs no lookup.
            if budget.is_some() {
                if let Value::String(s) = value {
                    if !is_absolute_url(s) {
                        rebuilt.insert(key.clone(), value.clone());
                        continue;
                    }
                }
            }
            rebuilt.insert(
                key.clone(),
                self.walk(value, &mut *visited, budget).await?,
            );
        }

        for id in registered {
            visited.remove(&id);
        }
        Ok(Value::Object(rebuilt))
    }
}

/// String leaves of a `url`/`uid` value: a bare string or an array of
/// strings.
fn identity_strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
