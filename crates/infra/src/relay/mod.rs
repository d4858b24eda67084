//! Remote ingestion relay
//!
//! Forwards decision events to the hosted ingestion endpoint with offline
//! queuing and opportunistic retry. Ingestion failures never surface to the
//! user and never block the local log or the page interaction.

mod errors;
mod ingest_client;
mod queue;
mod service;
mod worker;

pub use errors::RelayError;
pub use ingest_client::IngestClient;
pub use queue::StoredPendingQueue;
pub use service::{IngestBackend, Notifier, RelayOutcome, RelayService, TracingNotifier};
pub use worker::{RelayWorker, RelayWorkerConfig};
