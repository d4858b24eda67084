//! Port interfaces for the gate controller
//!
//! These traits define the boundaries between the state machine and the
//! page environment it runs in: the rendered prompt surface and the
//! message channel to the background authority.

use async_trait::async_trait;
use stopllms_domain::{GateDecision, LimitPeriod, Result};

/// The blocking/prompt UI rendered over the page.
///
/// Calls are synchronous DOM-style operations; implementations must not
/// block.
pub trait PromptSurface: Send + Sync {
    /// Show the non-dismissible usage-limit notice (close is the only
    /// action).
    fn render_blocked(&self, limit: u32, period: LimitPeriod);

    /// Show the justification modal with the proceed affordance locked and
    /// the countdown at its initial value.
    fn render_prompt(&self, min_reason_chars: usize, countdown_secs: u32);

    /// Update the countdown label/ring with the remaining seconds.
    fn update_countdown(&self, remaining_secs: u32);

    /// Enable the proceed affordance and remove the countdown ring.
    fn unlock_proceed(&self);

    /// Show the inline too-short-reason error.
    fn show_reason_error(&self);

    /// Remove the overlay and restore page scroll.
    fn dismiss(&self);
}

/// Channel from the gate to the background authority.
///
/// Emissions are fire-and-forget: the controller logs failures and never
/// blocks the page on them.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    /// Deliver a resolved decision for logging and relay.
    async fn emit(&self, decision: GateDecision) -> Result<()>;

    /// Ask the background authority to close the current tab (best effort).
    ///
    /// Hosts without tab control fall back to navigating the page to a
    /// blank document instead.
    async fn request_tab_close(&self) -> Result<()>;
}
