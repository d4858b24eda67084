//! # StopLLMs Infra
//!
//! Infrastructure adapters behind the core ports:
//!
//! - [`storage`]: SQLite-backed durable area and in-memory volatile area
//! - [`session`]: encrypted session-at-rest custody
//! - [`identity`]: per-install device identifier
//! - [`http`]: retrying HTTP client
//! - [`config`]: remote endpoint configuration
//! - [`relay`]: remote ingestion relay with durable offline queue

pub mod config;
pub mod http;
pub mod identity;
pub mod relay;
pub mod session;
pub mod storage;

pub use config::RemoteConfig;
pub use http::HttpClient;
pub use identity::DeviceIdentity;
pub use relay::{
    IngestBackend, IngestClient, RelayError, RelayOutcome, RelayService, RelayWorker,
    RelayWorkerConfig, StoredPendingQueue, TracingNotifier,
};
pub use session::SessionVault;
pub use storage::{MemoryStorage, SqliteStorage};
