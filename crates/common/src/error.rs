//! Foundation error type for the common crate

use thiserror::Error;

/// Errors raised by foundation utilities.
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommonError {
    /// Build a crypto error from any displayable cause.
    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }
}

/// Result type alias for foundation operations.
pub type CommonResult<T> = std::result::Result<T, CommonError>;
