//! Port interfaces for the pending-event relay queue

use async_trait::async_trait;
use stopllms_domain::{PendingEvent, Result};

/// Durable FIFO of remote events that have not yet reached the ingestion
/// endpoint.
///
/// Delivery is at-least-once: an event leaves the queue only after a
/// confirmed successful relay, so duplicates downstream are possible and
/// acceptable (ingestion is append-only).
#[async_trait]
pub trait PendingQueue: Send + Sync {
    /// Append an event; enqueueing is additive and never drops an event
    /// already pending.
    async fn enqueue(&self, event: &PendingEvent) -> Result<()>;

    /// Snapshot of the queue in arrival order.
    async fn entries(&self) -> Result<Vec<PendingEvent>>;

    /// Remove one event after its relay was confirmed.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Number of queued events.
    async fn len(&self) -> Result<usize>;
}
