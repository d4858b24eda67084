//! Periodic flush worker for the pending queue
//!
//! The relay drains its queue opportunistically whenever an event goes
//! through; this worker adds a scheduled flush so a long-idle profile still
//! catches up after connectivity returns. Lifecycle is explicit: the join
//! handle is tracked, cancellation is a token, and stopping waits with a
//! timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::service::RelayService;

/// Configuration for the relay worker.
#[derive(Debug, Clone)]
pub struct RelayWorkerConfig {
    /// Interval between flush attempts.
    pub poll_interval: Duration,
    /// Join timeout when stopping.
    pub join_timeout: Duration,
}

impl Default for RelayWorkerConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(60), join_timeout: Duration::from_secs(5) }
    }
}

/// Background flusher with explicit lifecycle management.
pub struct RelayWorker {
    relay: Arc<RelayService>,
    config: RelayWorkerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl RelayWorker {
    /// Create a worker over the relay service.
    pub fn new(relay: Arc<RelayService>, config: RelayWorkerConfig) -> Self {
        Self { relay, config, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Start the worker, spawning the background flush task.
    pub fn start(&mut self) -> Result<(), String> {
        if self.is_running() {
            return Err("Worker already running".to_string());
        }

        info!("Starting relay worker");
        self.cancellation = CancellationToken::new();

        let relay = Arc::clone(&self.relay);
        let poll_interval = self.config.poll_interval;
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::process_loop(relay, poll_interval, cancel).await;
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Stop the worker and wait for the flush task to finish.
    pub async fn stop(&mut self) -> Result<(), String> {
        if !self.is_running() {
            return Err("Worker not running".to_string());
        }

        info!("Stopping relay worker");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Worker task panicked: {}", e);
                    return Err("Worker task panicked".to_string());
                }
                Err(_) => {
                    warn!("Worker task did not complete within timeout");
                    return Err("Worker task timeout".to_string());
                }
            }
        }

        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a worker task is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    async fn process_loop(
        relay: Arc<RelayService>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Relay worker process loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(poll_interval) => {
                    let delivered = relay.flush_pending().await;
                    if delivered > 0 {
                        info!(delivered, "Relay worker drained pending events");
                    }
                }
            }
        }
    }
}

impl Drop for RelayWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("RelayWorker dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}
