//! # Token Issuance
//!
//! Builds `{userId, publicKey, targetDomain, timestamp, expiresAt}`, signs its
//! canonical bytes with the identity's private key, and returns the base64
//! envelope. No network access and no persisted state change.

use uauth_core::Clock;
use uauth_crypto::{CryptoProvider, KeyPair};

use crate::error::TokenError;
use crate::token::{SsoPayload, SsoToken, TOKEN_TTL};

/// Issues SSO tokens for one identity.
#[derive(Clone, Copy)]
pub struct SsoTokenIssuer<'a> {
    provider: &'a dyn CryptoProvider,
    clock: &'a dyn Clock,
    identity: Option<&'a KeyPair>,
}

impl<'a> SsoTokenIssuer<'a> {
    /// An issuer with no identity attached. [`issue`](Self::issue) fails with
    /// [`TokenError::NoIdentity`] until one is supplied.
    pub fn new(provider: &'a dyn CryptoProvider, clock: &'a dyn Clock) -> Self {
        Self {
            provider,
            clock,
            identity: None,
        }
    }

    /// Attach the identity tokens are issued for.
    pub fn with_identity(mut self, identity: &'a KeyPair) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Issue a token for `target_domain`, returned as a base64 string.
    pub fn issue(&self, target_domain: &str) -> Result<String, TokenError> {
        let token = self.issue_token(target_domain)?;
        Ok(token.encode()?)
    }

    /// Issue a token and return the structured form.
    pub fn issue_token(&self, target_domain: &str) -> Result<SsoToken, TokenError> {
        let identity = self.identity.ok_or(TokenError::NoIdentity)?;
        if self.provider.is_fallback() || identity.is_fallback {
            return Err(TokenError::UntrustedProvider);
        }
        if target_domain.is_empty() || target_domain.chars().any(char::is_whitespace) {
            return Err(TokenError::InvalidTargetDomain(target_domain.to_string()));
        }

        let now = self.clock.now();
        let payload = SsoPayload {
            user_id: identity.user_id.to_string(),
            public_key: identity.public_key.clone(),
            target_domain: target_domain.to_string(),
            timestamp: now,
            expires_at: now.saturating_add(TOKEN_TTL),
        };
        let signing_input = payload.signing_input()?;
        let signature = self.provider.sign(&identity.private_key, signing_input.as_bytes())?;

        tracing::debug!(
            user_id = %identity.user_id,
            target_domain,
            expires_at = %payload.expires_at,
            "issued SSO token"
        );
        Ok(SsoToken { payload, signature })
    }
}

impl std::fmt::Debug for SsoTokenIssuer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoTokenIssuer")
            .field("provider", &self.provider.kind())
            .field("user_id", &self.identity.map(|i| &i.user_id))
            .finish()
    }
}
