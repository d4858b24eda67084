//! Application constants
//!
//! Centralized location for all domain-level constants. Storage key strings
//! and the per-domain key formats are part of the on-disk contract with
//! earlier releases and must not change.

/// Durable storage key for the decision log.
pub const LOG_KEY: &str = "aidetox_log";

/// Durable storage key for the per-install device identifier.
pub const DEVICE_ID_KEY: &str = "aidetox_device_id";

/// Durable storage key for the encrypted session record.
pub const SESSION_KEY: &str = "aidetox_session";

/// Key for the session encryption key (volatile area + durable copy).
pub const ENC_KEY_KEY: &str = "aidetox_enc_key";

/// Durable storage key for the pending-event relay queue.
pub const PENDING_KEY: &str = "aidetox_pending";

// Gate policy settings keys (flat key/value records, written by the popup)
pub const USES_BEFORE_PROMPT_KEY: &str = "aidetox_uses_before_prompt";
pub const LIMIT_PERIOD_KEY: &str = "aidetox_limit_period";
pub const ALWAYS_ASK_KEY: &str = "aidetox_always_ask";
/// Unlock delay is persisted in seconds, exposed as milliseconds.
pub const UNLOCK_DELAY_KEY: &str = "aidetox_unlock_delay";
pub const MIN_CHARS_KEY: &str = "aidetox_min_chars";
pub const CHECK_REASON_KEY: &str = "aidetox_check_reason";

/// Maximum number of retained log entries; oldest are evicted first.
pub const MAX_LOG_ENTRIES: usize = 1000;

/// Freshness window of a granted allow marker.
pub const ALLOW_TTL_MS: u64 = 30_000;

/// Default countdown before the proceed affordance unlocks.
pub const DEFAULT_UNLOCK_DELAY_MS: u64 = 10_000;

/// Default minimum justification length in characters.
pub const DEFAULT_MIN_REASON_CHARS: usize = 10;

/// Hostnames subject to interception (matched by suffix).
pub const MONITORED_DOMAINS: &[&str] = &[
    "chatgpt.com",
    "chat.openai.com",
    "claude.ai",
    "gemini.google.com",
    "perplexity.ai",
    "copilot.microsoft.com",
    "poe.com",
    "character.ai",
    "huggingface.co",
    "openrouter.ai",
];

/// Page-local key holding the allow-until marker for one domain.
pub fn allow_until_key(domain: &str) -> String {
    format!("aidetox_v2_allow_until_{domain}")
}

/// Page-local key holding the local reason audit trail for one domain.
pub fn reasons_key(domain: &str) -> String {
    format!("aidetox_v2_reasons_{domain}")
}
