//! Errors raised while issuing a token.
//!
//! Verification never returns these; it answers with
//! [`TokenVerification`](crate::TokenVerification).

use thiserror::Error;
use uauth_core::{CanonicalizationError, CryptoError};

/// Token issuance failure.
#[derive(Error, Debug)]
pub enum TokenError {
    /// No identity was supplied to the issuer.
    #[error("no identity: generate or load one before issuing tokens")]
    NoIdentity,

    /// The active provider (or the identity's keys) came from the digest
    /// fallback, which cannot produce trust-bearing signatures.
    #[error("refusing to issue a token with the fallback provider")]
    UntrustedProvider,

    /// The target domain was empty or contained whitespace.
    #[error("invalid target domain: {0:?}")]
    InvalidTargetDomain(String),

    /// Canonicalizing the payload failed.
    #[error("payload canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Signing failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Serializing the token envelope failed.
    #[error("token serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
