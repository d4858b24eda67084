//! Encrypted session custody
//!
//! The session record is stored only in encrypted form (AES-256-GCM) in the
//! durable area. The 32-byte key lives in the volatile area — gone when the
//! browser session ends — with a durable mirror so a session survives a
//! restart. Anything unreadable (missing key, tampered record, malformed
//! JSON) reads as "no session", and the corrupt record is cleared so the
//! next read does not fail again.
//!
//! Lifecycle events (install/startup/suspend) clear the session explicitly;
//! that wiring lives in the background context.

use std::sync::Arc;

use serde_json::Value;
use stopllms_common::crypto::{EncryptionService, SealedData, KEY_LEN};
use stopllms_core::StorageArea;
use stopllms_domain::constants::{ENC_KEY_KEY, SESSION_KEY};
use stopllms_domain::{Result, Session, StopLlmsError};
use tracing::{debug, warn};

/// Secure session store over a durable and a volatile storage area.
pub struct SessionVault {
    durable: Arc<dyn StorageArea>,
    volatile: Arc<dyn StorageArea>,
}

impl SessionVault {
    /// Create a vault over the two storage areas.
    pub fn new(durable: Arc<dyn StorageArea>, volatile: Arc<dyn StorageArea>) -> Self {
        Self { durable, volatile }
    }

    /// Persist a session encrypted at rest.
    ///
    /// An absent or remote-auth-invalid session clears the stored record
    /// instead.
    pub async fn store(&self, session: Option<&Session>) -> Result<()> {
        let Some(session) = session.filter(|s| s.is_remote_auth_valid()) else {
            return self.clear().await;
        };

        let key = self.get_or_create_key().await?;
        let service = EncryptionService::new(&key).map_err(crypto_err)?;
        let plaintext =
            serde_json::to_vec(session).map_err(|e| StopLlmsError::Crypto(e.to_string()))?;
        let sealed = service.encrypt(&plaintext).map_err(crypto_err)?;
        let record =
            serde_json::to_value(&sealed).map_err(|e| StopLlmsError::Crypto(e.to_string()))?;
        self.durable.set(SESSION_KEY, record).await
    }

    /// Read the stored session, or `None` when absent or unreadable.
    pub async fn get(&self) -> Option<Session> {
        let record = self.durable.get(SESSION_KEY).await.ok().flatten()?;

        // Legacy unencrypted records are still readable but never written.
        if record.get("format").and_then(Value::as_str) == Some("plain") {
            return record
                .get("value")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok());
        }

        let Ok(sealed) = serde_json::from_value::<SealedData>(record) else {
            warn!("stored session record malformed; clearing");
            self.clear_best_effort().await;
            return None;
        };

        let Some(key) = self.existing_key().await else {
            debug!("no session key available; clearing unreadable session");
            self.clear_best_effort().await;
            return None;
        };

        let service = EncryptionService::new(&key).ok()?;
        match service.decrypt(&sealed) {
            Ok(plaintext) => serde_json::from_slice(&plaintext).ok(),
            Err(err) => {
                warn!(error = %err, "session decryption failed; clearing");
                self.clear_best_effort().await;
                None
            }
        }
    }

    /// Remove the session record and both key copies.
    pub async fn clear(&self) -> Result<()> {
        self.durable.remove(SESSION_KEY).await?;
        self.durable.remove(ENC_KEY_KEY).await?;
        self.volatile.remove(ENC_KEY_KEY).await?;
        Ok(())
    }

    async fn clear_best_effort(&self) {
        if let Err(err) = self.clear().await {
            warn!(error = %err, "failed to clear session record");
        }
    }

    /// Current key: volatile copy first, durable mirror as restart recovery.
    /// Every hit re-mirrors the key to both areas.
    async fn existing_key(&self) -> Option<[u8; KEY_LEN]> {
        for area in [&self.volatile, &self.durable] {
            if let Some(key) =
                area.get(ENC_KEY_KEY).await.ok().flatten().as_ref().and_then(parse_key)
            {
                self.mirror_key(&key).await;
                return Some(key);
            }
        }
        None
    }

    async fn get_or_create_key(&self) -> Result<[u8; KEY_LEN]> {
        if let Some(key) = self.existing_key().await {
            return Ok(key);
        }

        let key = EncryptionService::generate_key();
        let record = key_to_value(&key);
        self.volatile.set(ENC_KEY_KEY, record.clone()).await?;
        self.durable.set(ENC_KEY_KEY, record).await?;
        Ok(key)
    }

    async fn mirror_key(&self, key: &[u8; KEY_LEN]) {
        let record = key_to_value(key);
        for area in [&self.volatile, &self.durable] {
            if let Err(err) = area.set(ENC_KEY_KEY, record.clone()).await {
                debug!(error = %err, "key mirror write failed");
            }
        }
    }
}

fn parse_key(value: &Value) -> Option<[u8; KEY_LEN]> {
    let bytes: Vec<u8> = value
        .as_array()?
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect::<Option<_>>()?;
    bytes.try_into().ok()
}

fn key_to_value(key: &[u8; KEY_LEN]) -> Value {
    Value::Array(key.iter().map(|b| Value::from(*b)).collect())
}

fn crypto_err(err: stopllms_common::CommonError) -> StopLlmsError {
    StopLlmsError::Crypto(err.to_string())
}
