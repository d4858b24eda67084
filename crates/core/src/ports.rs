//! Port interfaces for platform storage
//!
//! These traits define the boundary between core business logic and the
//! host platform's storage facilities.

use async_trait::async_trait;
use serde_json::Value;
use stopllms_domain::Result;

/// A key/value storage area holding JSON values.
///
/// Mirrors the host platform's storage model: individual calls are atomic,
/// but there are no cross-call transactions. Implementations exist for the
/// durable profile-wide area, the volatile browser-session area, and the
/// page-local per-origin area.
#[async_trait]
pub trait StorageArea: Send + Sync {
    /// Read a value, `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete a key; deleting an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
