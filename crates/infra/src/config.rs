//! Remote endpoint configuration

use std::env;
use std::time::Duration;

/// Settings for the hosted backend (ingestion functions + REST surface).
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the hosted project, no trailing slash.
    pub base_url: String,
    /// Public project key, sent as the `apikey` header on every call.
    pub anon_key: String,
    /// Timeout per request attempt.
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ltjtjgdjllmbyknaygof.supabase.co".to_string(),
            // Injected from the environment; there is no meaningful default.
            anon_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RemoteConfig {
    /// Overlay the defaults with `STOPLLMS_SUPABASE_URL` /
    /// `STOPLLMS_SUPABASE_ANON_KEY` from the environment (a `.env` file is
    /// honoured when present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Ok(url) = env::var("STOPLLMS_SUPABASE_URL") {
            if !url.is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Ok(key) = env::var("STOPLLMS_SUPABASE_ANON_KEY") {
            config.anon_key = key;
        }
        config
    }

    /// The event ingestion endpoint.
    pub fn ingest_url(&self) -> String {
        format!("{}/functions/v1/ingest", self.base_url)
    }

    /// The device-liveness upsert endpoint.
    pub fn devices_url(&self) -> String {
        format!("{}/rest/v1/devices", self.base_url)
    }
}
