//! Common data types used throughout the application

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user decision recorded by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateEvent {
    /// The user justified the visit and went through.
    Proceed,
    /// The user backed out and the tab was closed.
    Close,
}

/// One user decision on a monitored page, as stored in the local log.
///
/// Entries are immutable once created; the log evicts oldest-first past its
/// capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Milliseconds since the UNIX epoch, assigned at creation.
    pub at: u64,
    pub event: GateEvent,
    /// Normalized hostname (lowercase, `www.` stripped).
    pub domain: Option<String>,
    /// Full page URL at decision time.
    pub url: Option<String>,
    /// Free-text justification; only present for proceed decisions.
    pub reason: Option<String>,
    /// Countdown that was enforced for this decision.
    pub unlock_delay_ms: Option<u64>,
}

/// A [`LogEntry`] enriched with device/profile identity for off-device
/// storage. `at` is ISO-8601 on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    pub at: String,
    pub event: GateEvent,
    pub domain: Option<String>,
    pub url: Option<String>,
    pub reason: Option<String>,
    pub unlock_delay_ms: Option<u64>,
}

/// Minimal identity attached to an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Authentication state for the current browser profile.
///
/// Stored only in encrypted form at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
}

impl Session {
    /// A session authenticates remote calls only when both tokens are
    /// present.
    pub fn is_remote_auth_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

/// Usage-limit accounting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitPeriod {
    Hour,
    Day,
    Week,
}

impl LimitPeriod {
    /// Window length in milliseconds.
    pub fn period_ms(self) -> u64 {
        match self {
            Self::Hour => 3_600_000,
            Self::Day => 86_400_000,
            Self::Week => 604_800_000,
        }
    }

    /// Parse a stored settings value; unknown strings fall back to `Day`.
    pub fn from_key(value: &str) -> Self {
        match value {
            "hour" => Self::Hour,
            "week" => Self::Week,
            _ => Self::Day,
        }
    }

    /// The settings-file representation.
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

/// User-configurable gate thresholds, read on every page evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Proceed count allowed per window before the gate hard-blocks;
    /// zero disables the limit.
    pub uses_before_prompt: u32,
    pub limit_period: LimitPeriod,
    /// When set, the short-term allow marker is ignored and every visit
    /// prompts.
    pub always_ask: bool,
    pub unlock_delay_ms: u64,
    pub min_reason_chars: usize,
    /// Advisory reason-quality scoring; never blocks submission.
    pub check_reason_quality: bool,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            uses_before_prompt: 0,
            limit_period: LimitPeriod::Day,
            always_ask: false,
            unlock_delay_ms: crate::constants::DEFAULT_UNLOCK_DELAY_MS,
            min_reason_chars: crate::constants::DEFAULT_MIN_REASON_CHARS,
            check_reason_quality: false,
        }
    }
}

/// A queued [`RemoteEvent`] awaiting relay to the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvent {
    pub id: String,
    pub queued_at: u64,
    pub event: RemoteEvent,
}

impl PendingEvent {
    /// Wrap a remote event with a fresh queue identity.
    pub fn new(queued_at: u64, event: RemoteEvent) -> Self {
        Self { id: Uuid::new_v4().to_string(), queued_at, event }
    }
}

/// What the gate controller emits when a prompt resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub event: GateEvent,
    pub domain: Option<String>,
    pub url: Option<String>,
    pub reason: Option<String>,
    pub unlock_delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_event_serializes_lowercase() {
        assert_eq!(serde_json::to_value(GateEvent::Proceed).unwrap(), "proceed");
        assert_eq!(serde_json::to_value(GateEvent::Close).unwrap(), "close");
    }

    #[test]
    fn log_entry_round_trips_with_wire_field_names() {
        let entry = LogEntry {
            at: 1_700_000_000_000,
            event: GateEvent::Proceed,
            domain: Some("claude.ai".into()),
            url: Some("https://claude.ai/chat".into()),
            reason: Some("deadline for the parser rewrite".into()),
            unlock_delay_ms: Some(10_000),
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["at"], 1_700_000_000_000u64);
        assert_eq!(value["event"], "proceed");
        assert_eq!(value["unlock_delay_ms"], 10_000);

        let back: LogEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn period_ms_matches_the_three_windows() {
        assert_eq!(LimitPeriod::Hour.period_ms(), 3_600_000);
        assert_eq!(LimitPeriod::Day.period_ms(), 86_400_000);
        assert_eq!(LimitPeriod::Week.period_ms(), 604_800_000);
    }

    #[test]
    fn unknown_period_parses_as_day() {
        assert_eq!(LimitPeriod::from_key("hour"), LimitPeriod::Hour);
        assert_eq!(LimitPeriod::from_key("fortnight"), LimitPeriod::Day);
        assert_eq!(LimitPeriod::from_key(""), LimitPeriod::Day);
    }

    #[test]
    fn default_policy_matches_shipped_defaults() {
        let policy = GatePolicy::default();
        assert_eq!(policy.uses_before_prompt, 0);
        assert_eq!(policy.limit_period, LimitPeriod::Day);
        assert!(!policy.always_ask);
        assert_eq!(policy.unlock_delay_ms, 10_000);
        assert_eq!(policy.min_reason_chars, 10);
        assert!(!policy.check_reason_quality);
    }

    #[test]
    fn session_validity_requires_both_tokens() {
        let user = SessionUser { id: "u1".into(), email: "u@example.com".into(), username: None };
        let full = Session {
            access_token: "a".into(),
            refresh_token: "r".into(),
            user: user.clone(),
        };
        assert!(full.is_remote_auth_valid());

        let missing_refresh =
            Session { access_token: "a".into(), refresh_token: String::new(), user };
        assert!(!missing_refresh.is_remote_auth_valid());
    }

    #[test]
    fn remote_event_omits_absent_profile_id() {
        let event = RemoteEvent {
            device_id: "dev_abc12345".into(),
            profile_id: None,
            at: "2026-01-01T00:00:00.000Z".into(),
            event: GateEvent::Close,
            domain: None,
            url: None,
            reason: None,
            unlock_delay_ms: Some(0),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("profile_id").is_none());
    }
}
