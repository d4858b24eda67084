//! Background message router
//!
//! The single authority behind the message channel: it authenticates the
//! sender, dispatches to the logbook and relay, and always answers with a
//! structured `{ok, ...}` response — exactly one per message, never a
//! thrown error.

use std::sync::Arc;

use serde_json::Value;
use stopllms_common::time::Clock;
use stopllms_core::EventLogbook;
use stopllms_domain::LogEntry;
use stopllms_infra::RelayService;
use tracing::{debug, warn};

use crate::context::TabHost;
use crate::protocol::{MessageSender, RouterRequest, RouterResponse};

/// Message router for the background context.
pub struct MessageRouter {
    runtime_id: String,
    extension_origin: String,
    logbook: Arc<EventLogbook>,
    relay: Arc<RelayService>,
    tabs: Arc<dyn TabHost>,
    clock: Arc<dyn Clock>,
}

impl MessageRouter {
    /// Create a router bound to the running extension's identity.
    pub fn new(
        runtime_id: impl Into<String>,
        logbook: Arc<EventLogbook>,
        relay: Arc<RelayService>,
        tabs: Arc<dyn TabHost>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let runtime_id = runtime_id.into();
        let extension_origin = format!("chrome-extension://{runtime_id}");
        Self { runtime_id, extension_origin, logbook, relay, tabs, clock }
    }

    /// The extension identity this router trusts.
    pub fn runtime_id(&self) -> &str {
        &self.runtime_id
    }

    /// Handle one message: authenticate, parse, dispatch.
    pub async fn handle(&self, sender: &MessageSender, payload: Value) -> RouterResponse {
        // The message channel itself is unauthenticated; this identity check
        // is the only defense against a page passing messages through.
        if !self.is_trusted(sender) {
            warn!(sender_id = ?sender.id, origin = ?sender.origin, "untrusted message sender");
            return RouterResponse::error("unauthorized_sender");
        }

        let request: RouterRequest = match serde_json::from_value(payload) {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "unparseable message");
                return RouterResponse::error("unknown_message");
            }
        };

        match request {
            RouterRequest::CloseTab => self.close_tab(sender).await,
            RouterRequest::LogDecision { event, domain, url, reason, unlock_delay_ms } => {
                self.log_decision(event, domain, url, reason, unlock_delay_ms).await
            }
            RouterRequest::GetLog => RouterResponse::with_log(self.logbook.entries_desc().await),
            RouterRequest::ClearLog => {
                if let Err(err) = self.logbook.clear().await {
                    warn!(error = %err, "log clear failed");
                }
                RouterResponse::ok()
            }
        }
    }

    fn is_trusted(&self, sender: &MessageSender) -> bool {
        sender.id.as_deref() == Some(self.runtime_id.as_str())
            || sender.origin.as_deref() == Some(self.extension_origin.as_str())
    }

    async fn close_tab(&self, sender: &MessageSender) -> RouterResponse {
        if let Some(tab_id) = sender.tab_id {
            // Best effort: the tab may already be closing.
            if let Err(err) = self.tabs.close_tab(tab_id).await {
                debug!(tab_id, error = %err, "tab close failed");
            }
        }
        RouterResponse::ok()
    }

    async fn log_decision(
        &self,
        event: stopllms_domain::GateEvent,
        domain: Option<String>,
        url: Option<String>,
        reason: Option<String>,
        unlock_delay_ms: Option<u64>,
    ) -> RouterResponse {
        let entry = LogEntry {
            at: self.clock.now_ms(),
            event,
            domain: domain.filter(|s| !s.is_empty()),
            url: url.filter(|s| !s.is_empty()),
            reason: reason.filter(|s| !s.is_empty()),
            unlock_delay_ms: unlock_delay_ms.filter(|ms| *ms > 0),
        };

        // The local append is the durable record; it never fails the caller.
        if let Err(err) = self.logbook.append(entry.clone()).await {
            warn!(error = %err, "local log append failed");
        }

        // The relay owns remote durability; failures end in its queue.
        self.relay.deliver(&entry).await;

        RouterResponse::ok()
    }
}
