//! In-memory storage area
//!
//! Backs the volatile (browser-session-scoped) area: contents live only as
//! long as the process. Dropping the store models a browser restart. Also
//! serves as the page-local per-origin area in tests.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use stopllms_core::StorageArea;
use stopllms_domain::Result;

/// Volatile key/value area over a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: DashMap<String, Value>,
}

impl MemoryStorage {
    /// Create an empty area.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageArea for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}
