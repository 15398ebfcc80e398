//! Errors surfaced by [`IdentityContext`](crate::IdentityContext).

use thiserror::Error;
use uauth_core::CryptoError;
use uauth_sso::TokenError;
use uauth_store::{ImportError, StoreError};

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum ContextError {
    /// Signing, issuing, or exporting was attempted before an identity
    /// exists.
    #[error("no identity: generate or import one first")]
    NoIdentity,

    /// A record is stored but cannot be opened: wrong or missing
    /// passphrase, corrupt data, or keys from another provider. Only
    /// `regenerate` may replace it.
    #[error("stored identity cannot be opened: {0}")]
    IdentityUnreadable(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("import rejected: {0}")]
    Import(#[from] ImportError),

    #[error(transparent)]
    Token(#[from] TokenError),
}
