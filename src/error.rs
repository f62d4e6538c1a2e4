//! Error types for token issuing

use thiserror::Error;

/// Errors that abort a token build
///
/// A failed build never yields a partial token. Retrying means starting a
/// fresh build with a new issue time and salt.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Caller-supplied data is unusable (empty app id, malformed certificate, oversize field)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The HMAC primitive rejected its key
    #[error("crypto failure: {0}")]
    Crypto(String),

    /// The raw deflate pass failed
    #[error("compression failure: {0}")]
    Compression(#[from] std::io::Error),
}

impl TokenError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        TokenError::InvalidInput(msg.into())
    }
}

/// Result type for token operations
pub type Result<T> = std::result::Result<T, TokenError>;
