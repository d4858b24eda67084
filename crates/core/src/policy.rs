//! Gate policy persistence
//!
//! The policy lives as flat key/value settings in the durable storage area
//! (the popup writes them, the gate reads them). Missing or malformed values
//! fall back to shipped defaults so a half-written settings record can never
//! block evaluation. The unlock delay is persisted in seconds for
//! compatibility with stored settings and exposed as milliseconds.

use std::sync::Arc;

use serde_json::{json, Value};
use stopllms_domain::constants::{
    ALWAYS_ASK_KEY, CHECK_REASON_KEY, LIMIT_PERIOD_KEY, MIN_CHARS_KEY, UNLOCK_DELAY_KEY,
    USES_BEFORE_PROMPT_KEY,
};
use stopllms_domain::{GatePolicy, LimitPeriod, Result};

use crate::ports::StorageArea;

/// Typed access to the user-configurable gate thresholds.
pub struct PolicyStore {
    store: Arc<dyn StorageArea>,
}

impl PolicyStore {
    /// Create a policy store over the durable storage area.
    pub fn new(store: Arc<dyn StorageArea>) -> Self {
        Self { store }
    }

    /// Load the current policy, defaulting each missing field.
    pub async fn load(&self) -> GatePolicy {
        let defaults = GatePolicy::default();

        let uses_before_prompt = self
            .read(USES_BEFORE_PROMPT_KEY)
            .await
            .and_then(|v| v.as_u64())
            .map_or(defaults.uses_before_prompt, |v| v.min(u64::from(u32::MAX)) as u32);

        let limit_period = self
            .read(LIMIT_PERIOD_KEY)
            .await
            .and_then(|v| v.as_str().map(LimitPeriod::from_key))
            .unwrap_or(defaults.limit_period);

        let always_ask =
            self.read(ALWAYS_ASK_KEY).await.and_then(|v| v.as_bool()).unwrap_or(false);

        let unlock_delay_ms = self
            .read(UNLOCK_DELAY_KEY)
            .await
            .and_then(|v| v.as_u64())
            .map_or(defaults.unlock_delay_ms, |secs| secs * 1000);

        let min_reason_chars = self
            .read(MIN_CHARS_KEY)
            .await
            .and_then(|v| v.as_u64())
            .map_or(defaults.min_reason_chars, |v| v as usize);

        let check_reason_quality =
            self.read(CHECK_REASON_KEY).await.and_then(|v| v.as_bool()).unwrap_or(false);

        GatePolicy {
            uses_before_prompt,
            limit_period,
            always_ask,
            unlock_delay_ms,
            min_reason_chars,
            check_reason_quality,
        }
    }

    /// Persist every policy field back to its settings key.
    pub async fn save(&self, policy: &GatePolicy) -> Result<()> {
        self.store.set(USES_BEFORE_PROMPT_KEY, json!(policy.uses_before_prompt)).await?;
        self.store.set(LIMIT_PERIOD_KEY, json!(policy.limit_period.as_key())).await?;
        self.store.set(ALWAYS_ASK_KEY, json!(policy.always_ask)).await?;
        self.store.set(UNLOCK_DELAY_KEY, json!(policy.unlock_delay_ms / 1000)).await?;
        self.store.set(MIN_CHARS_KEY, json!(policy.min_reason_chars)).await?;
        self.store.set(CHECK_REASON_KEY, json!(policy.check_reason_quality)).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Option<Value> {
        self.store.get(key).await.ok().flatten()
    }
}
