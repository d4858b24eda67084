//! Relay orchestration
//!
//! `RelayService` turns a local log entry into a remote event and gets it
//! off the device: directly when an authenticated session exists, through
//! the durable pending queue otherwise. Every failure path ends in the
//! queue — the caller never sees an error.

use std::sync::Arc;

use async_trait::async_trait;
use stopllms_common::time::{ms_to_iso, Clock};
use stopllms_core::sync::PendingQueue;
use stopllms_domain::{LogEntry, PendingEvent, RemoteEvent};
use tracing::{debug, info, warn};

use super::errors::RelayError;
use crate::identity::DeviceIdentity;
use crate::session::SessionVault;

/// Interface to the remote ingestion service.
#[async_trait]
pub trait IngestBackend: Send + Sync {
    /// Make a stored token pair the active session for subsequent calls.
    async fn restore_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), RelayError>;

    /// Update device liveness server-side (best effort).
    async fn touch_device(&self, device_id: &str) -> Result<(), RelayError>;

    /// Deliver one event to the ingestion endpoint.
    async fn send(&self, event: &RemoteEvent) -> Result<(), RelayError>;
}

/// User-facing nudges emitted by the relay.
pub trait Notifier: Send + Sync {
    /// An event was queued because no authenticated session exists.
    fn login_required(&self);
}

/// Default notifier: a log line, nothing modal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn login_required(&self) {
        info!("sign in to sync your decisions; events are queued locally until then");
    }
}

/// Where a delivered event ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Accepted by the ingestion endpoint.
    Sent,
    /// Parked in the pending queue for a later flush.
    Queued,
}

/// Remote ingestion relay.
pub struct RelayService {
    backend: Arc<dyn IngestBackend>,
    queue: Arc<dyn PendingQueue>,
    vault: Arc<SessionVault>,
    identity: Arc<DeviceIdentity>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl RelayService {
    /// Wire a relay over its collaborators.
    pub fn new(
        backend: Arc<dyn IngestBackend>,
        queue: Arc<dyn PendingQueue>,
        vault: Arc<SessionVault>,
        identity: Arc<DeviceIdentity>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { backend, queue, vault, identity, notifier, clock }
    }

    /// Forward one decision off the device.
    ///
    /// Without a remote-auth-valid session the event is queued and a
    /// login-required nudge is emitted; with one, the backlog is flushed
    /// first and the current event is sent, queueing it again on failure.
    pub async fn deliver(&self, entry: &LogEntry) -> RelayOutcome {
        let device_id = self.identity.get_or_create().await;

        let session = self.vault.get().await.filter(|s| s.is_remote_auth_valid());
        let Some(session) = session else {
            let event = to_remote_event(entry, device_id, None);
            self.park(event).await;
            self.notifier.login_required();
            return RelayOutcome::Queued;
        };

        if let Err(err) =
            self.backend.restore_session(&session.access_token, &session.refresh_token).await
        {
            warn!(error = %err, "session restore failed; continuing unauthenticated");
        }

        if let Err(err) = self.backend.touch_device(&device_id).await {
            debug!(error = %err, "device liveness update failed");
        }

        self.flush_pending().await;

        let event = to_remote_event(entry, device_id, Some(session.user.id.clone()));
        match self.backend.send(&event).await {
            Ok(()) => RelayOutcome::Sent,
            Err(err) => {
                warn!(error = %err, "event ingestion failed; queueing for retry");
                self.park(event).await;
                RelayOutcome::Queued
            }
        }
    }

    /// Attempt every queued event, removing only those confirmed sent.
    ///
    /// Failed events stay queued in order; returns the number delivered.
    pub async fn flush_pending(&self) -> usize {
        let pending = match self.queue.entries().await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "pending queue read failed; skipping flush");
                return 0;
            }
        };

        if pending.is_empty() {
            return 0;
        }

        debug!(count = pending.len(), "flushing pending events");
        let mut delivered = 0;
        for item in pending {
            match self.backend.send(&item.event).await {
                Ok(()) => match self.queue.remove(&item.id).await {
                    Ok(()) => delivered += 1,
                    Err(err) => {
                        // The event went through but is still queued; the
                        // next flush will resend it (at-least-once).
                        warn!(error = %err, id = %item.id, "failed to dequeue sent event");
                    }
                },
                Err(err) => {
                    debug!(error = %err, id = %item.id, "queued event still failing");
                }
            }
        }
        delivered
    }

    async fn park(&self, event: RemoteEvent) {
        let pending = PendingEvent::new(self.clock.now_ms(), event);
        if let Err(err) = self.queue.enqueue(&pending).await {
            warn!(error = %err, "failed to enqueue event; it is lost");
        }
    }
}

fn to_remote_event(entry: &LogEntry, device_id: String, profile_id: Option<String>) -> RemoteEvent {
    RemoteEvent {
        device_id,
        profile_id,
        at: ms_to_iso(entry.at),
        event: entry.event,
        domain: entry.domain.clone(),
        url: entry.url.clone(),
        reason: entry.reason.clone(),
        unlock_delay_ms: entry.unlock_delay_ms,
    }
}
