//! In-process decision sink
//!
//! Adapts the gate controller's [`DecisionSink`] port onto the message
//! router, exactly as the content script speaks to the background worker:
//! a `AIDETOX_LOG` message per decision and a `AIDETOX_CLOSE_TAB` request,
//! both fire-and-forget from the page's point of view.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use stopllms_core::gate::ports::DecisionSink;
use stopllms_domain::{GateDecision, Result};

use crate::protocol::MessageSender;
use crate::router::MessageRouter;

/// Decision sink that feeds the background router directly.
pub struct RouterDecisionSink {
    router: Arc<MessageRouter>,
    sender: MessageSender,
}

impl RouterDecisionSink {
    /// Create a sink speaking as a content script in the given tab.
    pub fn new(router: Arc<MessageRouter>, tab_id: u32) -> Self {
        let sender = MessageSender {
            id: Some(router.runtime_id().to_string()),
            origin: None,
            tab_id: Some(tab_id),
        };
        Self { router, sender }
    }
}

#[async_trait]
impl DecisionSink for RouterDecisionSink {
    async fn emit(&self, decision: GateDecision) -> Result<()> {
        let payload = json!({
            "type": "AIDETOX_LOG",
            "event": decision.event,
            "domain": decision.domain,
            "url": decision.url,
            "reason": decision.reason,
            "unlock_delay_ms": decision.unlock_delay_ms,
        });
        self.router.handle(&self.sender, payload).await;
        Ok(())
    }

    async fn request_tab_close(&self) -> Result<()> {
        self.router.handle(&self.sender, json!({"type": "AIDETOX_CLOSE_TAB"})).await;
        Ok(())
    }
}
