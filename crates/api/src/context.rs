//! Background context - dependency injection container
//!
//! Wires the storage areas, session vault, device identity, relay, and
//! router into one composition root, and owns the lifecycle transitions
//! (install/startup/suspend) that clear the stored session.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use stopllms_common::time::{Clock, SystemClock};
use stopllms_core::{EventLogbook, PolicyStore, StorageArea};
use stopllms_domain::{Result, StopLlmsError};
use stopllms_infra::{
    DeviceIdentity, IngestClient, MemoryStorage, RelayService, RelayWorker, RelayWorkerConfig,
    RemoteConfig, SessionVault, SqliteStorage, StoredPendingQueue, TracingNotifier,
};
use tracing::info;

use crate::router::MessageRouter;

/// Host capability to close a tab.
///
/// Errors are always swallowed by the router: the tab may already be
/// closing.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Close the given tab, best effort.
    async fn close_tab(&self, tab_id: u32) -> Result<()>;
}

/// Host lifecycle transitions the background context reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The extension was installed or updated.
    Installed,
    /// The browser started a new session.
    Startup,
    /// The background context is being torn down.
    Suspend,
}

/// Configuration for the background context.
#[derive(Debug, Clone)]
pub struct BackgroundConfig {
    /// The running extension's identity; the router trusts only this.
    pub runtime_id: String,
    /// Durable database location; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    /// Remote backend endpoints.
    pub remote: RemoteConfig,
}

/// Background context - holds all services and dependencies.
pub struct BackgroundContext {
    pub router: Arc<MessageRouter>,
    pub relay: Arc<RelayService>,
    pub vault: Arc<SessionVault>,
    pub policy: Arc<PolicyStore>,
    pub logbook: Arc<EventLogbook>,
    relay_worker: RelayWorker,
}

impl BackgroundContext {
    /// Build the full service graph.
    pub fn new(config: &BackgroundConfig, tabs: Arc<dyn TabHost>) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let durable: Arc<dyn StorageArea> = match &config.db_path {
            Some(path) => Arc::new(SqliteStorage::open(path)?),
            None => Arc::new(SqliteStorage::open_in_memory()?),
        };
        let volatile: Arc<dyn StorageArea> = Arc::new(MemoryStorage::new());

        let logbook = Arc::new(EventLogbook::new(durable.clone()));
        let policy = Arc::new(PolicyStore::new(durable.clone()));
        let vault = Arc::new(SessionVault::new(durable.clone(), volatile));
        let identity = Arc::new(DeviceIdentity::new(durable.clone()));

        let backend = IngestClient::new(config.remote.clone(), clock.clone())
            .map_err(|e| StopLlmsError::Internal(e.to_string()))?;
        let queue = Arc::new(StoredPendingQueue::new(durable));
        let relay = Arc::new(RelayService::new(
            Arc::new(backend),
            queue,
            vault.clone(),
            identity,
            Arc::new(TracingNotifier),
            clock.clone(),
        ));

        let router = Arc::new(MessageRouter::new(
            config.runtime_id.clone(),
            logbook.clone(),
            relay.clone(),
            tabs,
            clock,
        ));

        let relay_worker = RelayWorker::new(relay.clone(), RelayWorkerConfig::default());

        Ok(Self { router, relay, vault, policy, logbook, relay_worker })
    }

    /// Start the background flush worker.
    pub fn start_workers(&mut self) -> Result<()> {
        self.relay_worker.start().map_err(StopLlmsError::Internal)
    }

    /// Stop the background flush worker.
    pub async fn stop_workers(&mut self) -> Result<()> {
        self.relay_worker.stop().await.map_err(StopLlmsError::Internal)
    }

    /// React to a host lifecycle transition.
    ///
    /// Sessions are intentionally not carried across these boundaries: the
    /// stored record and its key material are cleared, and the user signs
    /// in again from the popup.
    pub async fn on_lifecycle(&self, event: LifecycleEvent) -> Result<()> {
        info!(?event, "lifecycle transition; clearing stored session");
        self.vault.clear().await
    }
}
