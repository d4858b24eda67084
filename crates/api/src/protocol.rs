//! Background message protocol
//!
//! The wire contract between content scripts, the popup, and the background
//! router. Requests are a closed tagged union on the `type` field; anything
//! that does not parse into a known variant is answered with
//! `unknown_message` rather than an error return.

use serde::{Deserialize, Serialize};
use stopllms_domain::{GateEvent, LogEntry};

/// Identity of a message sender as reported by the platform runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSender {
    /// Extension id of the sending context, when it has one.
    pub id: Option<String>,
    /// Origin of the sending page (`chrome-extension://<id>` for extension
    /// pages).
    pub origin: Option<String>,
    /// Tab the message came from, for tab-scoped actions.
    pub tab_id: Option<u32>,
}

/// Requests accepted by the background router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RouterRequest {
    /// Best-effort close of the sender's tab.
    #[serde(rename = "AIDETOX_CLOSE_TAB")]
    CloseTab,

    /// Record a gate decision and forward it to the relay.
    #[serde(rename = "AIDETOX_LOG")]
    LogDecision {
        event: GateEvent,
        #[serde(default)]
        domain: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        unlock_delay_ms: Option<u64>,
    },

    /// Fetch the full decision log, most recent first.
    #[serde(rename = "AIDETOX_GET_LOG")]
    GetLog,

    /// Replace the decision log with an empty list.
    #[serde(rename = "AIDETOX_CLEAR_LOG")]
    ClearLog,
}

/// Response shape shared by every handler: `{ok, error?, log?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<LogEntry>>,
}

impl RouterResponse {
    /// Plain success.
    pub fn ok() -> Self {
        Self { ok: true, error: None, log: None }
    }

    /// Success carrying the decision log.
    pub fn with_log(log: Vec<LogEntry>) -> Self {
        Self { ok: true, error: None, log: Some(log) }
    }

    /// Structured failure; never thrown to the caller.
    pub fn error(code: impl Into<String>) -> Self {
        Self { ok: false, error: Some(code.into()), log: None }
    }
}
