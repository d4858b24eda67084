//! Cryptographic primitives for sealing secrets at rest.
//!
//! Provides AES-256-GCM encryption over per-install random keys:
//!
//! - [`EncryptionService`]: AES-256-GCM encryption/decryption
//! - [`SealedData`]: serializable ciphertext container
//!
//! Keys are raw 32-byte values generated from the OS RNG; there is no
//! password-based derivation. The serialized [`SealedData`] shape
//! (`{"iv": [...], "data": [...]}`) is the storage contract for encrypted
//! records and must not change.
//!
//! ## Usage
//!
//! ```rust
//! use stopllms_common::crypto::EncryptionService;
//!
//! let key = EncryptionService::generate_key();
//! let service = EncryptionService::new(&key)?;
//!
//! let sealed = service.encrypt(b"sensitive data")?;
//! let plain = service.decrypt(&sealed)?;
//! assert_eq!(plain, b"sensitive data");
//! # Ok::<(), stopllms_common::CommonError>(())
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// AES-256-GCM key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Sealed ciphertext container persisted to a storage area.
///
/// Serializes as plain byte arrays so the at-rest record is
/// `{"iv": [..12 numbers..], "data": [..numbers..]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedData {
    pub iv: Vec<u8>,
    pub data: Vec<u8>,
}

/// AES-256-GCM encryption service over a raw symmetric key.
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService").field("key", &"[REDACTED]").finish()
    }
}

impl EncryptionService {
    /// Create a new encryption service from a raw 32-byte key.
    pub fn new(key: &[u8]) -> CommonResult<Self> {
        if key.len() != KEY_LEN {
            return Err(CommonError::crypto("encryption key must be exactly 32 bytes"));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CommonError::crypto(format!("failed to create cipher: {e}")))?;

        Ok(Self { cipher })
    }

    /// Generate a random 32-byte symmetric key.
    pub fn generate_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Encrypt bytes into a [`SealedData`] payload with a fresh nonce.
    pub fn encrypt(&self, data: &[u8]) -> CommonResult<SealedData> {
        let nonce_bytes = Self::generate_nonce();
        let ciphertext = self
            .cipher
            .encrypt(&Nonce::from(nonce_bytes), data)
            .map_err(|e| CommonError::crypto(format!("encryption failed: {e}")))?;

        Ok(SealedData { iv: nonce_bytes.to_vec(), data: ciphertext })
    }

    /// Decrypt a [`SealedData`] payload back into raw bytes.
    ///
    /// Tampered or garbage input is an error, never a panic. Callers that
    /// treat a bad record as "absent" map the error themselves.
    pub fn decrypt(&self, sealed: &SealedData) -> CommonResult<Vec<u8>> {
        let nonce_array: [u8; NONCE_LEN] = sealed
            .iv
            .as_slice()
            .try_into()
            .map_err(|_| CommonError::crypto("nonce must be exactly 12 bytes"))?;

        self.cipher
            .decrypt(&Nonce::from(nonce_array), sealed.data.as_ref())
            .map_err(|e| CommonError::crypto(format!("decryption failed: {e}")))
    }

    fn generate_nonce() -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }
}
