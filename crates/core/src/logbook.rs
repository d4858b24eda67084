//! Bounded local ledger of gate decisions
//!
//! The logbook is an append-only list capped at
//! [`MAX_LOG_ENTRIES`](stopllms_domain::constants::MAX_LOG_ENTRIES); once the
//! cap is exceeded the oldest entries are evicted. Reads degrade to an empty
//! log on storage failure so gating never hard-fails on a broken store.

use std::sync::Arc;

use serde_json::Value;
use stopllms_domain::constants::{LOG_KEY, MAX_LOG_ENTRIES};
use stopllms_domain::{GateEvent, LogEntry, Result};
use tracing::warn;

use crate::ports::StorageArea;

/// Append-only decision log over a durable storage area.
pub struct EventLogbook {
    store: Arc<dyn StorageArea>,
}

impl EventLogbook {
    /// Create a logbook over the given durable storage area.
    pub fn new(store: Arc<dyn StorageArea>) -> Self {
        Self { store }
    }

    /// Append one entry, evicting oldest entries past the capacity.
    ///
    /// Read-modify-write: concurrent appends from separate contexts can lose
    /// an entry, matching the storage model of the host platform (individual
    /// calls atomic, no cross-call transactions).
    pub async fn append(&self, entry: LogEntry) -> Result<()> {
        let mut log = self.read_log().await;
        log.push(entry);
        if log.len() > MAX_LOG_ENTRIES {
            let excess = log.len() - MAX_LOG_ENTRIES;
            log.drain(..excess);
        }
        self.store.set(LOG_KEY, serde_json::to_value(&log).map_err(to_storage_err)?).await
    }

    /// The full log, most recent first.
    pub async fn entries_desc(&self) -> Vec<LogEntry> {
        let mut log = self.read_log().await;
        log.sort_by(|a, b| b.at.cmp(&a.at));
        log
    }

    /// Replace the log with an empty list.
    pub async fn clear(&self) -> Result<()> {
        self.store.set(LOG_KEY, Value::Array(Vec::new())).await
    }

    /// Count proceed decisions inside the window `(now - period_ms, now]`.
    ///
    /// The comparison is strict (`now - at < period_ms`), so an entry exactly
    /// one period old no longer counts.
    pub async fn recent_proceed_count(&self, now_ms: u64, period_ms: u64) -> usize {
        self.read_log()
            .await
            .iter()
            .filter(|e| e.event == GateEvent::Proceed && now_ms.saturating_sub(e.at) < period_ms)
            .count()
    }

    async fn read_log(&self) -> Vec<LogEntry> {
        let raw = match self.store.get(LOG_KEY).await {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "log read failed; treating log as empty");
                return Vec::new();
            }
        };

        match serde_json::from_value(raw) {
            Ok(log) => log,
            Err(err) => {
                warn!(error = %err, "log record malformed; treating log as empty");
                Vec::new()
            }
        }
    }
}

fn to_storage_err(err: serde_json::Error) -> stopllms_domain::StopLlmsError {
    stopllms_domain::StopLlmsError::Storage(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemStore {
        values: Mutex<HashMap<String, Value>>,
        fail_reads: bool,
    }

    #[async_trait]
    impl StorageArea for MemStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            if self.fail_reads {
                return Err(stopllms_domain::StopLlmsError::Storage("read failure".into()));
            }
            Ok(self.values.lock().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: Value) -> Result<()> {
            self.values.lock().await.insert(key.to_string(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.values.lock().await.remove(key);
            Ok(())
        }
    }

    fn entry(at: u64, event: GateEvent) -> LogEntry {
        LogEntry {
            at,
            event,
            domain: Some("claude.ai".into()),
            url: Some("https://claude.ai/".into()),
            reason: None,
            unlock_delay_ms: None,
        }
    }

    #[tokio::test]
    async fn append_caps_at_capacity_keeping_most_recent() {
        let logbook = EventLogbook::new(Arc::new(MemStore::default()));

        for at in 0..(MAX_LOG_ENTRIES as u64 + 5) {
            logbook.append(entry(at, GateEvent::Proceed)).await.unwrap();
        }

        let mut log = logbook.entries_desc().await;
        assert_eq!(log.len(), MAX_LOG_ENTRIES);

        // Oldest five evicted, relative order of the survivors intact.
        log.reverse();
        assert_eq!(log[0].at, 5);
        assert_eq!(log[MAX_LOG_ENTRIES - 1].at, MAX_LOG_ENTRIES as u64 + 4);
    }

    #[tokio::test]
    async fn entries_are_sorted_descending_by_timestamp() {
        let logbook = EventLogbook::new(Arc::new(MemStore::default()));
        for at in [30u64, 10, 20] {
            logbook.append(entry(at, GateEvent::Close)).await.unwrap();
        }

        let log = logbook.entries_desc().await;
        assert_eq!(log.iter().map(|e| e.at).collect::<Vec<_>>(), vec![30, 20, 10]);
    }

    #[tokio::test]
    async fn window_count_honours_each_period() {
        let logbook = EventLogbook::new(Arc::new(MemStore::default()));
        let now: u64 = 700_000_000_000;

        // One proceed 30 minutes ago, one 5 hours ago, one 3 days ago,
        // plus a close inside the window which never counts.
        logbook.append(entry(now - 1_800_000, GateEvent::Proceed)).await.unwrap();
        logbook.append(entry(now - 18_000_000, GateEvent::Proceed)).await.unwrap();
        logbook.append(entry(now - 259_200_000, GateEvent::Proceed)).await.unwrap();
        logbook.append(entry(now - 60_000, GateEvent::Close)).await.unwrap();

        assert_eq!(logbook.recent_proceed_count(now, 3_600_000).await, 1);
        assert_eq!(logbook.recent_proceed_count(now, 86_400_000).await, 2);
        assert_eq!(logbook.recent_proceed_count(now, 604_800_000).await, 3);
    }

    #[tokio::test]
    async fn window_boundary_is_strict() {
        let logbook = EventLogbook::new(Arc::new(MemStore::default()));
        let now: u64 = 10_000_000;
        logbook.append(entry(now - 3_600_000, GateEvent::Proceed)).await.unwrap();

        assert_eq!(logbook.recent_proceed_count(now, 3_600_000).await, 0);
        assert_eq!(logbook.recent_proceed_count(now, 3_600_001).await, 1);
    }

    #[tokio::test]
    async fn read_failure_degrades_to_empty() {
        let store = Arc::new(MemStore { fail_reads: true, ..MemStore::default() });
        let logbook = EventLogbook::new(store);

        assert!(logbook.entries_desc().await.is_empty());
        assert_eq!(logbook.recent_proceed_count(1, 1).await, 0);
    }

    #[tokio::test]
    async fn malformed_record_degrades_to_empty() {
        let store = Arc::new(MemStore::default());
        store.set(LOG_KEY, Value::String("not a log".into())).await.unwrap();

        let logbook = EventLogbook::new(store);
        assert!(logbook.entries_desc().await.is_empty());
    }

    #[tokio::test]
    async fn clear_replaces_with_empty_list() {
        let logbook = EventLogbook::new(Arc::new(MemStore::default()));
        logbook.append(entry(1, GateEvent::Proceed)).await.unwrap();
        logbook.clear().await.unwrap();
        assert!(logbook.entries_desc().await.is_empty());
    }
}
