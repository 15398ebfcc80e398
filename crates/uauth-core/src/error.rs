//! # Error Types
//!
//! Errors shared across the workspace. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! "This signature does not match" is deliberately absent: verification
//! answers with a boolean or a tagged result. The variants here describe
//! inputs that could not be processed at all.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Timestamps are integer epoch milliseconds.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Neither the primary primitive nor a usable fallback is available.
    #[error("cryptography unavailable: {0}")]
    Unavailable(String),

    /// Structurally invalid key or signature material (bad hex, wrong
    /// length, wrong key encoding). A caller bug, not a forged input.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Key generation failed after a provider was selected.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),
}
