//! Relay error types

use stopllms_domain::StopLlmsError;
use thiserror::Error;

/// Errors raised while talking to the remote ingestion service.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("remote returned status {0}")]
    Http(u16),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<StopLlmsError> for RelayError {
    fn from(err: StopLlmsError) -> Self {
        match err {
            StopLlmsError::Network(msg) => Self::Network(msg),
            StopLlmsError::Auth(msg) => Self::Auth(msg),
            other => Self::Network(other.to_string()),
        }
    }
}
