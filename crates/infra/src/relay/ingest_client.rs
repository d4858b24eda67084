//! HTTP client for the hosted ingestion service

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Method;
use serde_json::json;
use stopllms_common::time::{ms_to_iso, Clock};
use stopllms_domain::RemoteEvent;
use tracing::{debug, instrument};

use super::errors::RelayError;
use super::service::IngestBackend;
use crate::config::RemoteConfig;
use crate::http::HttpClient;

#[derive(Clone)]
struct TokenPair {
    access: String,
    refresh: String,
}

/// Remote backend client: event ingestion plus device liveness.
///
/// Holds the currently restored session tokens; `apikey` is sent on every
/// call, a bearer `Authorization` only while a session is restored.
pub struct IngestClient {
    config: RemoteConfig,
    http: HttpClient,
    clock: Arc<dyn Clock>,
    tokens: RwLock<Option<TokenPair>>,
}

impl IngestClient {
    /// Create a client for the configured remote project.
    pub fn new(config: RemoteConfig, clock: Arc<dyn Clock>) -> Result<Self, RelayError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::Config(e.to_string()))?;
        Ok(Self { config, http, clock, tokens: RwLock::new(None) })
    }

    /// Drop the restored session (sign-out).
    pub fn forget_session(&self) {
        *self.tokens.write() = None;
    }

    fn bearer(&self) -> Option<String> {
        self.tokens.read().as_ref().map(|t| t.access.clone())
    }
}

#[async_trait]
impl IngestBackend for IngestClient {
    /// Make a stored token pair the client's active session.
    ///
    /// Purely local: the tokens are attached to subsequent calls, which is
    /// where an invalid pair would fail.
    async fn restore_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), RelayError> {
        if access_token.is_empty() || refresh_token.is_empty() {
            return Err(RelayError::Auth("cannot restore a session without both tokens".into()));
        }
        *self.tokens.write() =
            Some(TokenPair { access: access_token.to_string(), refresh: refresh_token.to_string() });
        Ok(())
    }

    /// Upsert device liveness (`last_seen`) on the REST surface.
    #[instrument(skip(self))]
    async fn touch_device(&self, device_id: &str) -> Result<(), RelayError> {
        // Unauthenticated REST calls authorize with the project key itself.
        let bearer = self.bearer().unwrap_or_else(|| self.config.anon_key.clone());

        let request = self
            .http
            .request(Method::POST, self.config.devices_url())
            .header("apikey", self.config.anon_key.as_str())
            .header("Authorization", format!("Bearer {bearer}"))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&json!({
                "id": device_id,
                "last_seen": ms_to_iso(self.clock.now_ms()),
            }));

        let response =
            self.http.send(request).await.map_err(|e| RelayError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Http(status.as_u16()));
        }
        debug!(device_id, "device liveness updated");
        Ok(())
    }

    /// POST one event to the ingestion function.
    #[instrument(skip(self, event), fields(event = ?event.event, domain = ?event.domain))]
    async fn send(&self, event: &RemoteEvent) -> Result<(), RelayError> {
        let mut request = self
            .http
            .request(Method::POST, self.config.ingest_url())
            .header("apikey", self.config.anon_key.as_str())
            .json(event);

        if let Some(access) = self.bearer() {
            request = request.header("Authorization", format!("Bearer {access}"));
        }

        let response =
            self.http.send(request).await.map_err(|e| RelayError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Http(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use stopllms_common::time::MockClock;
    use stopllms_domain::GateEvent;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(base_url: String) -> RemoteConfig {
        RemoteConfig {
            base_url,
            anon_key: "anon-key".into(),
            timeout: Duration::from_secs(2),
        }
    }

    fn event() -> RemoteEvent {
        RemoteEvent {
            device_id: "dev_a1b2c3d4".into(),
            profile_id: None,
            at: "2026-02-01T10:00:00.000Z".into(),
            event: GateEvent::Proceed,
            domain: Some("claude.ai".into()),
            url: Some("https://claude.ai/chat".into()),
            reason: Some("reviewing a pull request".into()),
            unlock_delay_ms: Some(10_000),
        }
    }

    async fn client(server: &MockServer) -> IngestClient {
        IngestClient::new(config(server.uri()), Arc::new(MockClock::new(1_700_000_000_000)))
            .unwrap()
    }

    #[tokio::test]
    async fn send_posts_the_event_with_the_project_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/ingest"))
            .and(header("apikey", "anon-key"))
            .and(body_partial_json(json!({
                "device_id": "dev_a1b2c3d4",
                "event": "proceed",
                "domain": "claude.ai",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).await.send(&event()).await.unwrap();
    }

    #[tokio::test]
    async fn send_adds_bearer_only_after_session_restore() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/ingest"))
            .and(header("Authorization", "Bearer access-token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        client.restore_session("access-token", "refresh-token").await.unwrap();
        client.send(&event()).await.unwrap();
    }

    #[tokio::test]
    async fn non_2xx_is_an_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/ingest"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).await.send(&event()).await.unwrap_err();
        assert!(matches!(err, RelayError::Http(401)));
    }

    #[tokio::test]
    async fn touch_device_upserts_with_merge_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/devices"))
            .and(header("Prefer", "resolution=merge-duplicates"))
            .and(header_exists("Authorization"))
            .and(body_partial_json(json!({
                "id": "dev_a1b2c3d4",
                "last_seen": "2023-11-14T22:13:20.000Z",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).await.touch_device("dev_a1b2c3d4").await.unwrap();
    }

    #[tokio::test]
    async fn restore_requires_both_tokens() {
        let server = MockServer::start().await;
        let client = client(&server).await;
        assert!(client.restore_session("access", "").await.is_err());
        assert!(client.bearer().is_none());
    }
}
