//! Full interception flow through the real background stack
//!
//! Drives a `GateController` whose decision sink speaks the message
//! protocol to a real `MessageRouter` wired by `BackgroundContext`: the
//! same path a content script takes through the background worker.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use stopllms_core::gate::ports::PromptSurface;
use stopllms_core::{GateController, GateEnvironment, GateState, ProceedOutcome};
use stopllms_domain::{GateEvent, LimitPeriod, Result};
use stopllms_infra::{MemoryStorage, RemoteConfig};
use stopllms_api::{
    BackgroundConfig, BackgroundContext, MessageSender, RouterDecisionSink, TabHost,
};

#[derive(Default)]
struct RecordingTabs {
    closed: Mutex<Vec<u32>>,
}

#[async_trait]
impl TabHost for RecordingTabs {
    async fn close_tab(&self, tab_id: u32) -> Result<()> {
        self.closed.lock().unwrap().push(tab_id);
        Ok(())
    }
}

#[derive(Default)]
struct QuietSurface;

impl PromptSurface for QuietSurface {
    fn render_blocked(&self, _limit: u32, _period: LimitPeriod) {}
    fn render_prompt(&self, _min_reason_chars: usize, _countdown_secs: u32) {}
    fn update_countdown(&self, _remaining_secs: u32) {}
    fn unlock_proceed(&self) {}
    fn show_reason_error(&self) {}
    fn dismiss(&self) {}
}

struct Flow {
    ctx: BackgroundContext,
    tabs: Arc<RecordingTabs>,
    page_store: Arc<MemoryStorage>,
}

fn flow() -> Flow {
    let tabs = Arc::new(RecordingTabs::default());
    let config = BackgroundConfig {
        runtime_id: "stopllms-extension".into(),
        db_path: None,
        remote: RemoteConfig::default(),
    };
    let ctx = BackgroundContext::new(&config, tabs.clone()).expect("context");
    Flow { ctx, tabs, page_store: Arc::new(MemoryStorage::new()) }
}

impl Flow {
    fn controller(&self, page_url: &str, tab_id: u32) -> GateController {
        let env = GateEnvironment {
            policy: self.ctx.policy.clone(),
            logbook: self.ctx.logbook.clone(),
            page_store: self.page_store.clone(),
            surface: Arc::new(QuietSurface),
            sink: Arc::new(RouterDecisionSink::new(self.ctx.router.clone(), tab_id)),
            clock: Arc::new(stopllms_common::time::SystemClock),
        };
        GateController::new(page_url, env)
    }

    fn popup_sender(&self) -> MessageSender {
        MessageSender {
            id: None,
            origin: Some("chrome-extension://stopllms-extension".into()),
            tab_id: None,
        }
    }
}

#[tokio::test]
async fn proceed_flow_logs_queues_and_suppresses_the_next_prompt() {
    let flow = flow();

    let mut gate = flow.controller("https://claude.ai/chat", 3);
    assert!(matches!(*gate.evaluate().await, GateState::Prompting { remaining_ticks: 10 }));

    for _ in 0..10 {
        gate.tick();
    }
    assert_eq!(gate.state(), &GateState::Unlocked);
    assert_eq!(
        gate.proceed("writing the release announcement").await,
        ProceedOutcome::Accepted
    );

    // The decision travelled through the router into the log...
    let log = flow.ctx.logbook.entries_desc().await;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].event, GateEvent::Proceed);
    assert_eq!(log[0].domain.as_deref(), Some("claude.ai"));
    assert_eq!(log[0].reason.as_deref(), Some("writing the release announcement"));

    // A sibling tab inside the TTL is allowed straight through.
    let mut sibling = flow.controller("https://claude.ai/new", 4);
    assert_eq!(sibling.evaluate().await, &GateState::AllowedByCache);

    // The popup can read the log over the same channel.
    let response = flow
        .ctx
        .router
        .handle(&flow.popup_sender(), json!({"type": "AIDETOX_GET_LOG"}))
        .await;
    assert!(response.ok);
    assert_eq!(response.log.map(|l| l.len()), Some(1));
}

#[tokio::test]
async fn limit_reached_blocks_and_close_shuts_the_tab() {
    let flow = flow();

    // Two uses per hour allowed, both already spent.
    let mut policy = flow.ctx.policy.load().await;
    policy.uses_before_prompt = 2;
    policy.limit_period = LimitPeriod::Hour;
    flow.ctx.policy.save(&policy).await.unwrap();

    for _ in 0..2 {
        flow.ctx
            .router
            .handle(
                &flow.popup_sender(),
                json!({"type": "AIDETOX_LOG", "event": "proceed", "domain": "chatgpt.com"}),
            )
            .await;
    }

    let mut gate = flow.controller("https://chatgpt.com/", 11);
    assert_eq!(gate.evaluate().await, &GateState::Blocked);

    gate.close().await;
    assert_eq!(gate.state(), &GateState::Resolved(GateEvent::Close));
    assert_eq!(flow.tabs.closed.lock().unwrap().clone(), vec![11]);

    // The close landed in the log with a zero delay (stored as absent).
    let log = flow.ctx.logbook.entries_desc().await;
    assert_eq!(log.len(), 3);
    let close = log.iter().find(|e| e.event == GateEvent::Close).unwrap();
    assert_eq!(close.unlock_delay_ms, None);
}
