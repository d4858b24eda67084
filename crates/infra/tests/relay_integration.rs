//! End-to-end relay tests against a mock ingestion server
//!
//! Exercises the real `IngestClient` + `StoredPendingQueue` + `SessionVault`
//! stack: authenticated delivery, offline queueing, and recovery once the
//! endpoint comes back.

use std::sync::Arc;
use std::time::Duration;

use stopllms_common::time::MockClock;
use stopllms_core::sync::PendingQueue;
use stopllms_domain::{GateEvent, LogEntry, Session, SessionUser};
use stopllms_infra::{
    DeviceIdentity, IngestClient, MemoryStorage, RelayOutcome, RelayService, RemoteConfig,
    SessionVault, StoredPendingQueue, TracingNotifier,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    relay: RelayService,
    queue: Arc<StoredPendingQueue>,
    vault: Arc<SessionVault>,
}

fn stack(server_uri: String) -> Stack {
    let durable = Arc::new(MemoryStorage::new());
    let volatile = Arc::new(MemoryStorage::new());
    let clock = Arc::new(MockClock::new(1_700_000_000_000));

    let config = RemoteConfig {
        base_url: server_uri,
        anon_key: "anon-key".into(),
        timeout: Duration::from_secs(2),
    };
    let client = IngestClient::new(config, clock.clone()).expect("client");

    let queue = Arc::new(StoredPendingQueue::new(durable.clone()));
    let vault = Arc::new(SessionVault::new(durable.clone(), volatile));

    let relay = RelayService::new(
        Arc::new(client),
        queue.clone(),
        vault.clone(),
        Arc::new(DeviceIdentity::new(durable)),
        Arc::new(TracingNotifier),
        clock,
    );

    Stack { relay, queue, vault }
}

fn session() -> Session {
    Session {
        access_token: "access-abc".into(),
        refresh_token: "refresh-def".into(),
        user: SessionUser {
            id: "profile-1".into(),
            email: "user@example.com".into(),
            username: None,
        },
    }
}

fn entry() -> LogEntry {
    LogEntry {
        at: 1_700_000_000_000,
        event: GateEvent::Proceed,
        domain: Some("chatgpt.com".into()),
        url: Some("https://chatgpt.com/".into()),
        reason: Some("comparing embeddings libraries".into()),
        unlock_delay_ms: Some(10_000),
    }
}

#[tokio::test]
async fn authenticated_delivery_hits_ingest_with_bearer_and_profile() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/devices"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/ingest"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer access-abc"))
        .and(body_partial_json(serde_json::json!({
            "profile_id": "profile-1",
            "event": "proceed",
            "domain": "chatgpt.com",
            "unlock_delay_ms": 10_000,
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let stack = stack(server.uri());
    stack.vault.store(Some(&session())).await.unwrap();

    assert_eq!(stack.relay.deliver(&entry()).await, RelayOutcome::Sent);
    assert_eq!(stack.queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn server_failure_parks_the_event_until_a_successful_flush() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/devices"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    // The ingest endpoint is down.
    let outage = Mock::given(method("POST"))
        .and(path("/functions/v1/ingest"))
        .respond_with(ResponseTemplate::new(500))
        .mount_as_scoped(&server)
        .await;

    let stack = stack(server.uri());
    stack.vault.store(Some(&session())).await.unwrap();

    assert_eq!(stack.relay.deliver(&entry()).await, RelayOutcome::Queued);
    assert_eq!(stack.queue.len().await.unwrap(), 1);

    // Recovery: the endpoint is healthy again.
    drop(outage);
    Mock::given(method("POST"))
        .and(path("/functions/v1/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert_eq!(stack.relay.flush_pending().await, 1);
    assert_eq!(stack.queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn no_session_queues_without_touching_the_network() {
    let server = MockServer::start().await;
    // No mounted mocks: any request would 404 and fail `.expect` counters;
    // the relay must not call out at all.

    let stack = stack(server.uri());
    assert_eq!(stack.relay.deliver(&entry()).await, RelayOutcome::Queued);
    assert_eq!(stack.queue.len().await.unwrap(), 1);

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
