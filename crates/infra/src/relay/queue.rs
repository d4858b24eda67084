//! Durable pending-event queue
//!
//! A JSON array of [`PendingEvent`] under a single durable key. Events are
//! removed only after a confirmed send, so an interrupted flush leaves them
//! queued (at-least-once delivery).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use stopllms_core::sync::PendingQueue;
use stopllms_core::StorageArea;
use stopllms_domain::constants::PENDING_KEY;
use stopllms_domain::{PendingEvent, Result, StopLlmsError};
use tracing::warn;

/// Pending-event queue over the durable storage area.
pub struct StoredPendingQueue {
    store: Arc<dyn StorageArea>,
}

impl StoredPendingQueue {
    /// Create a queue over the durable storage area.
    pub fn new(store: Arc<dyn StorageArea>) -> Self {
        Self { store }
    }

    async fn read_queue(&self) -> Result<Vec<PendingEvent>> {
        let raw = match self.store.get(PENDING_KEY).await? {
            Some(value) => value,
            None => return Ok(Vec::new()),
        };

        match serde_json::from_value(raw) {
            Ok(queue) => Ok(queue),
            Err(err) => {
                // An unreadable queue cannot be replayed; start fresh rather
                // than wedging every future enqueue.
                warn!(error = %err, "pending queue malformed; discarding");
                Ok(Vec::new())
            }
        }
    }

    async fn write_queue(&self, queue: &[PendingEvent]) -> Result<()> {
        let value =
            serde_json::to_value(queue).map_err(|e| StopLlmsError::Storage(e.to_string()))?;
        self.store.set(PENDING_KEY, value).await
    }
}

#[async_trait]
impl PendingQueue for StoredPendingQueue {
    async fn enqueue(&self, event: &PendingEvent) -> Result<()> {
        let mut queue = self.read_queue().await?;
        queue.push(event.clone());
        self.write_queue(&queue).await
    }

    async fn entries(&self) -> Result<Vec<PendingEvent>> {
        self.read_queue().await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let mut queue = self.read_queue().await?;
        queue.retain(|e| e.id != id);
        self.write_queue(&queue).await
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.read_queue().await?.len())
    }
}
