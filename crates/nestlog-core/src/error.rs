//! Error types for the Nestlog session core

use thiserror::Error;

/// Failure to read claims out of a bearer token.
///
/// Decode failure always means "treat as unauthenticated"; it must never
/// propagate as a crash past the component that attempted the decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token does not have three segments")]
    Malformed,

    #[error("token payload is not valid base64url: {0}")]
    Payload(#[from] base64::DecodeError),

    #[error("token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main error type for session and tenancy operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication is locked out for {remaining_ms} ms")]
    Lockout { remaining_ms: i64 },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("network error: {0}")]
    Network(String),

    #[error("session expired")]
    ExpiredSession,

    #[error("cross-tenant violation: {0}")]
    CrossTenant(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("token decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type alias using the core Error
pub type Result<T> = std::result::Result<T, Error>;
