//! # Store Errors
//!
//! Two families. `StoreError` covers the backing store and sealing and is
//! only raised for genuine I/O or configuration failures; unreadable records
//! load as `None`. `ImportError` explains why an exported identity was
//! refused. A refused import writes nothing.

use std::path::PathBuf;

use thiserror::Error;
use uauth_core::CryptoError;

/// Failure of the backing store or of sealing.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Storage keys are restricted to ASCII letters, digits, `-`, `_`, `.`.
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    /// Record serialization failed.
    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key derivation or encryption failed while sealing.
    #[error("sealing failed: {0}")]
    Sealing(String),

    /// No identity is stored.
    #[error("no identity stored")]
    NotFound,

    /// Key material could not be processed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Why an exported identity was refused.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Not a JSON object.
    #[error("import is not valid JSON: {0}")]
    InvalidJson(String),

    /// Export format version this build does not read.
    #[error("unsupported export version {0}")]
    UnsupportedVersion(u64),

    /// A required field is absent or not a string.
    #[error("missing required field {0:?}")]
    MissingField(&'static str),

    /// A field is not well-formed hex.
    #[error("field {field:?} is not well-formed hex")]
    MalformedHex { field: &'static str },

    /// The key material does not parse for the active provider.
    #[error("key material rejected: {0}")]
    InvalidKey(CryptoError),

    /// The private key does not produce the stated public key.
    #[error("private key does not match public key")]
    KeyMismatch,

    /// `userId` is not the identifier derived from `publicKey`.
    #[error("userId does not match publicKey")]
    UserIdMismatch,

    /// The validated identity could not be written.
    #[error("failed to persist imported identity: {0}")]
    Store(#[from] StoreError),
}
