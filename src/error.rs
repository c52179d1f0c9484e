//! Unified error types for the Safe message client
//!
//! Every fallible operation returns [`SafeResult`]. Malformed input,
//! unreachable dependencies and malformed remote payloads each carry their
//! own [`ErrorCode`]. A signature that simply does not verify is not an
//! error: the verifier reports it as `Ok(false)`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::eip712::{Eip712Error, SignerError};

/// Main error type for all client operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeMessageError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl SafeMessageError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn hash_derivation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::HashDerivation, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, msg)
    }

    pub fn relay(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RelayError, msg)
    }

    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningFailed, msg)
    }

    /// True for failures of an external dependency (relay or node).
    ///
    /// The client never retries on its own; this is what a caller checks
    /// before deciding to back off and try again.
    pub fn is_network(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::NetworkError | ErrorCode::Timeout | ErrorCode::RelayError | ErrorCode::RpcError
        )
    }
}

impl fmt::Display for SafeMessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for SafeMessageError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidAddress,
    HashDerivation,

    // Network errors
    NetworkError,
    Timeout,
    RelayError,
    RpcError,

    // Crypto errors
    SigningFailed,

    // Parse errors
    ParseError,
    JsonError,
    HexError,
    AbiError,
}

/// Result type alias for client operations
pub type SafeResult<T> = Result<T, SafeMessageError>;

// Conversions from common error types

impl From<serde_json::Error> for SafeMessageError {
    fn from(e: serde_json::Error) -> Self {
        SafeMessageError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for SafeMessageError {
    fn from(e: hex::FromHexError) -> Self {
        SafeMessageError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<reqwest::Error> for SafeMessageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SafeMessageError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            SafeMessageError::new(ErrorCode::NetworkError, "Connection failed")
        } else {
            SafeMessageError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}

impl From<url::ParseError> for SafeMessageError {
    fn from(e: url::ParseError) -> Self {
        SafeMessageError::new(ErrorCode::InvalidInput, format!("Invalid URL: {}", e))
    }
}

impl From<ethers_core::abi::Error> for SafeMessageError {
    fn from(e: ethers_core::abi::Error) -> Self {
        SafeMessageError::new(ErrorCode::AbiError, e.to_string())
    }
}

impl From<Eip712Error> for SafeMessageError {
    fn from(e: Eip712Error) -> Self {
        SafeMessageError::new(ErrorCode::HashDerivation, e.to_string())
    }
}

impl From<SignerError> for SafeMessageError {
    fn from(e: SignerError) -> Self {
        match e {
            SignerError::TypedData(inner) => inner.into(),
            other => SafeMessageError::new(ErrorCode::SigningFailed, other.to_string()),
        }
    }
}
