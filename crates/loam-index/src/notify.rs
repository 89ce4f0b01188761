//! Change-notification bus.
//!
//! Every insert, update, and delete emits one [`ChangeEvent`]. The
//! [`Notifier`] trait abstracts the transport; [`BroadcastNotifier`] is the
//! in-process implementation over a tokio broadcast channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::Result;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// One change to one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The kind of change.
    pub op: ChangeOp,
    /// The canonical URL of the affected record.
    pub url: String,
}

/// Notification transport.
///
/// Implementations must be thread-safe (Send + Sync). Publishing must not
/// fail just because nobody is listening.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish one change event.
    async fn publish(&self, event: ChangeEvent) -> Result<()>;
}

/// In-process notifier over a tokio broadcast channel.
///
/// Slow subscribers can lag and miss events (broadcast semantics); the
/// write path never blocks on them.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastNotifier {
    /// Create a notifier buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn publish(&self, event: ChangeEvent) -> Result<()> {
        trace!(op = ?event.op, url = %event.url, "change event");
        // A send error only means there are no subscribers right now.
        let _ = self.tx.send(event);
        Ok(())
    }
}

/// A notifier that drops everything. The default when no bus is wired up.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn publish(&self, _event: ChangeEvent) -> Result<()> {
        Ok(())
    }
}
