//! The gate controller state machine

use std::sync::Arc;

use serde_json::json;
use stopllms_common::time::{ms_to_iso, Clock};
use stopllms_domain::constants::{allow_until_key, reasons_key, ALLOW_TTL_MS};
use stopllms_domain::{GateDecision, GateEvent, GatePolicy};
use tracing::{debug, warn};
use url::Url;

use super::ports::{DecisionSink, PromptSurface};
use super::{is_monitored_host, normalize_host};
use crate::logbook::EventLogbook;
use crate::policy::PolicyStore;
use crate::ports::StorageArea;
use crate::reason::is_substantive_reason;

/// Position of one controller in the interception flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Not on a monitored domain; the page proceeds untouched.
    Idle,
    /// Policy and history are being loaded.
    Evaluating,
    /// Usage limit reached; close is the only action.
    Blocked,
    /// A fresh allow marker short-circuited the prompt; no UI, no log entry.
    AllowedByCache,
    /// Prompt rendered, proceed locked behind the countdown.
    Prompting { remaining_ticks: u32 },
    /// Countdown finished; proceed is enabled, reason still unvalidated.
    Unlocked,
    /// A decision was emitted; the controller is done.
    Resolved(GateEvent),
}

/// Outcome of a proceed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProceedOutcome {
    /// Decision emitted; the overlay is gone and the allow marker is set.
    Accepted,
    /// The affordance is still locked (or the prompt is not active); no-op.
    Locked,
    /// The reason failed the length check; inline error shown.
    ReasonTooShort,
}

/// Everything the controller needs from its environment.
pub struct GateEnvironment {
    pub policy: Arc<PolicyStore>,
    pub logbook: Arc<EventLogbook>,
    /// Page-local per-origin area (allow marker, reason audit trail).
    pub page_store: Arc<dyn StorageArea>,
    pub surface: Arc<dyn PromptSurface>,
    pub sink: Arc<dyn DecisionSink>,
    pub clock: Arc<dyn Clock>,
}

/// Per-page interception state machine.
///
/// The embedding page drives the countdown by calling [`tick`] once per
/// second while the state is `Prompting`; resolving the prompt (close or
/// proceed) implicitly cancels the countdown because the state leaves
/// `Prompting`.
///
/// [`tick`]: GateController::tick
pub struct GateController {
    page_url: String,
    domain: Option<String>,
    policy: GatePolicy,
    state: GateState,
    decision_emitted: bool,
    env: GateEnvironment,
}

impl GateController {
    /// Create a controller for one page load.
    ///
    /// The hostname is taken from `page_url`; an unparsable URL or an
    /// unmonitored host leaves the controller permanently [`GateState::Idle`].
    pub fn new(page_url: impl Into<String>, env: GateEnvironment) -> Self {
        let page_url = page_url.into();
        let domain = Url::parse(&page_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .filter(|h| is_monitored_host(h))
            .map(|h| normalize_host(&h));

        Self {
            page_url,
            domain,
            policy: GatePolicy::default(),
            state: GateState::Idle,
            decision_emitted: false,
            env,
        }
    }

    /// Current state.
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Evaluate the page: block, short-circuit, or prompt.
    ///
    /// The usage-limit check runs first and pre-empts the allow marker.
    pub async fn evaluate(&mut self) -> &GateState {
        let Some(domain) = self.domain.clone() else {
            self.state = GateState::Idle;
            return &self.state;
        };

        self.state = GateState::Evaluating;
        self.policy = self.env.policy.load().await;

        let now = self.env.clock.now_ms();
        let period_ms = self.policy.limit_period.period_ms();
        let used = self.env.logbook.recent_proceed_count(now, period_ms).await;

        if self.policy.uses_before_prompt > 0 && used >= self.policy.uses_before_prompt as usize {
            debug!(domain = %domain, used, "usage limit reached; blocking");
            self.env
                .surface
                .render_blocked(self.policy.uses_before_prompt, self.policy.limit_period);
            self.state = GateState::Blocked;
            return &self.state;
        }

        if !self.policy.always_ask && self.allow_marker_fresh(&domain, now).await {
            debug!(domain = %domain, "recent allow marker; skipping prompt");
            self.state = GateState::AllowedByCache;
            return &self.state;
        }

        let ticks = countdown_ticks(self.policy.unlock_delay_ms);
        self.env.surface.render_prompt(self.policy.min_reason_chars, ticks);
        self.state = if ticks == 0 {
            self.env.surface.unlock_proceed();
            GateState::Unlocked
        } else {
            GateState::Prompting { remaining_ticks: ticks }
        };
        &self.state
    }

    /// Advance the countdown by one second.
    ///
    /// A no-op outside `Prompting`; at zero the proceed affordance unlocks.
    pub fn tick(&mut self) {
        if let GateState::Prompting { remaining_ticks } = self.state {
            let remaining = remaining_ticks.saturating_sub(1);
            if remaining == 0 {
                self.env.surface.unlock_proceed();
                self.state = GateState::Unlocked;
            } else {
                self.env.surface.update_countdown(remaining);
                self.state = GateState::Prompting { remaining_ticks: remaining };
            }
        }
    }

    /// The user backed out. Permitted in every prompt state, locked or not.
    ///
    /// Emits a `close` decision — with delay 0 from the blocked notice,
    /// with the configured delay from the prompt — then requests a tab
    /// close.
    pub async fn close(&mut self) {
        let unlock_delay_ms = match self.state {
            GateState::Blocked => 0,
            GateState::Prompting { .. } | GateState::Unlocked => self.policy.unlock_delay_ms,
            _ => return,
        };

        self.emit(GateDecision {
            event: GateEvent::Close,
            domain: self.domain.clone(),
            url: Some(self.page_url.clone()),
            reason: None,
            unlock_delay_ms,
        })
        .await;

        if let Err(err) = self.env.sink.request_tab_close().await {
            warn!(error = %err, "tab close request failed");
        }
        self.state = GateState::Resolved(GateEvent::Close);
    }

    /// The user tries to go through with the given justification.
    pub async fn proceed(&mut self, reason: &str) -> ProceedOutcome {
        if self.state != GateState::Unlocked {
            return ProceedOutcome::Locked;
        }

        let trimmed = reason.trim();
        if trimmed.chars().count() < self.policy.min_reason_chars {
            self.env.surface.show_reason_error();
            return ProceedOutcome::ReasonTooShort;
        }

        // Advisory only: a low-effort reason is recorded but never blocks.
        if self.policy.check_reason_quality && !is_substantive_reason(trimmed) {
            debug!(domain = ?self.domain, "reason scored as low-effort");
        }

        let now = self.env.clock.now_ms();
        if let Some(domain) = self.domain.clone() {
            self.append_reason_audit(&domain, now, trimmed).await;
            self.set_allow_marker(&domain, now).await;
        }

        self.env.surface.dismiss();
        self.emit(GateDecision {
            event: GateEvent::Proceed,
            domain: self.domain.clone(),
            url: Some(self.page_url.clone()),
            reason: Some(trimmed.to_string()),
            unlock_delay_ms: self.policy.unlock_delay_ms,
        })
        .await;

        self.state = GateState::Resolved(GateEvent::Proceed);
        ProceedOutcome::Accepted
    }

    /// Check the allow marker, clamping a marker further than one TTL in
    /// the future back to zero (corrupt value).
    async fn allow_marker_fresh(&self, domain: &str, now: u64) -> bool {
        let key = allow_until_key(domain);
        let raw = self.env.page_store.get(&key).await.ok().flatten();
        let mut until = raw
            .as_ref()
            .and_then(|v| v.as_str().and_then(|s| s.parse::<u64>().ok()).or_else(|| v.as_u64()))
            .unwrap_or(0);

        if until > now + ALLOW_TTL_MS {
            until = 0;
            if let Err(err) = self.env.page_store.set(&key, json!("0")).await {
                warn!(error = %err, "failed to reset corrupt allow marker");
            }
        }

        now < until
    }

    async fn set_allow_marker(&self, domain: &str, now: u64) {
        let key = allow_until_key(domain);
        let until = (now + ALLOW_TTL_MS).to_string();
        if let Err(err) = self.env.page_store.set(&key, json!(until)).await {
            warn!(error = %err, "failed to set allow marker");
        }
    }

    /// Local-only audit trail of accepted reasons; failures are ignored.
    async fn append_reason_audit(&self, domain: &str, now: u64, reason: &str) {
        let key = reasons_key(domain);
        let mut entries = match self.env.page_store.get(&key).await {
            Ok(Some(serde_json::Value::Array(items))) => items,
            _ => Vec::new(),
        };
        entries.push(json!({ "at": ms_to_iso(now), "reason": reason }));
        if let Err(err) = self.env.page_store.set(&key, serde_json::Value::Array(entries)).await {
            debug!(error = %err, "reason audit append failed");
        }
    }

    /// Emit at most one decision per controller lifecycle; sink failures
    /// are logged and swallowed.
    async fn emit(&mut self, decision: GateDecision) {
        if self.decision_emitted {
            return;
        }
        self.decision_emitted = true;
        if let Err(err) = self.env.sink.emit(decision).await {
            warn!(error = %err, "decision emission failed");
        }
    }
}

fn countdown_ticks(unlock_delay_ms: u64) -> u32 {
    unlock_delay_ms.div_ceil(1000).min(u64::from(u32::MAX)) as u32
}
