//! # Token Verification
//!
//! Checks run cheapest first and stop at the first failure:
//!
//! 1. base64 + JSON decode (`parse_error`)
//! 2. `expiresAt` against the local clock (`expired`)
//! 3. the validity window: `expiresAt - timestamp` within [`TOKEN_TTL`] and
//!    `timestamp` not in the future (`invalid_lifetime`)
//! 4. Ed25519 signature over the canonical payload (`invalid_signature`)
//! 5. `userId` recomputed from `publicKey` (`user_id_mismatch`)
//! 6. `targetDomain` against the expected domain, when one is configured
//!    (`domain_mismatch`)
//!
//! An expired token is reported as `expired` even when its signature would
//! have failed. Trust is trust-on-first-use: a valid result proves the
//! holder of the embedded key issued the token, nothing more.
//!
//! Expiry reads the verifier's own clock. Skew against the issuer shifts the
//! effective window; `with_leeway` widens it by a fixed amount.

use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uauth_core::{derive_user_id, Clock};
use uauth_crypto::{CryptoProvider, Ed25519Provider};

use crate::token::{SsoToken, TOKEN_TTL};

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    ParseError,
    Expired,
    InvalidSignature,
    InvalidLifetime,
    UserIdMismatch,
    DomainMismatch,
}

impl InvalidReason {
    /// Wire name of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "parse_error",
            Self::Expired => "expired",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidLifetime => "invalid_lifetime",
            Self::UserIdMismatch => "user_id_mismatch",
            Self::DomainMismatch => "domain_mismatch",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InvalidReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of verifying a token. Serializes as
/// `{"valid":true,"userId":..,"publicKey":..}` or
/// `{"valid":false,"reason":..}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerification {
    Valid { user_id: String, public_key: String },
    Invalid { reason: InvalidReason },
}

impl TokenVerification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid { reason } => Some(*reason),
        }
    }

    fn invalid(reason: InvalidReason) -> Self {
        tracing::debug!(%reason, "rejected SSO token");
        Self::Invalid { reason }
    }
}

impl Serialize for TokenVerification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Valid { user_id, public_key } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("valid", &true)?;
                map.serialize_entry("userId", user_id)?;
                map.serialize_entry("publicKey", public_key)?;
                map.end()
            }
            Self::Invalid { reason } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("valid", &false)?;
                map.serialize_entry("reason", reason)?;
                map.end()
            }
        }
    }
}

/// Verifies SSO tokens against a clock.
#[derive(Clone, Copy)]
pub struct SsoTokenVerifier<'a> {
    clock: &'a dyn Clock,
    leeway: Duration,
    expected_domain: Option<&'a str>,
}

impl<'a> SsoTokenVerifier<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            leeway: Duration::ZERO,
            expected_domain: None,
        }
    }

    /// Accept tokens up to `leeway` past their `expiresAt`.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Reject tokens minted for any other domain.
    pub fn with_expected_domain(mut self, domain: &'a str) -> Self {
        self.expected_domain = Some(domain);
        self
    }

    /// Verify a base64 token string.
    pub fn verify(&self, token: &str) -> TokenVerification {
        match SsoToken::decode(token) {
            Ok(token) => self.verify_token(&token),
            Err(e) => {
                tracing::debug!(error = %e, "token did not decode");
                TokenVerification::invalid(InvalidReason::ParseError)
            }
        }
    }

    /// Verify an already-decoded token.
    pub fn verify_token(&self, token: &SsoToken) -> TokenVerification {
        let payload = &token.payload;

        let now = self.clock.now();
        if now > payload.expires_at.saturating_add(self.leeway) {
            return TokenVerification::invalid(InvalidReason::Expired);
        }

        let lifetime =
            i128::from(payload.expires_at.as_millis()) - i128::from(payload.timestamp.as_millis());
        let max_lifetime = i128::try_from(TOKEN_TTL.as_millis()).unwrap_or(i128::MAX);
        let issued_in_future = payload.timestamp > now.saturating_add(self.leeway);
        if !(0..=max_lifetime).contains(&lifetime) || issued_in_future {
            return TokenVerification::invalid(InvalidReason::InvalidLifetime);
        }

        let signature_ok = payload
            .signing_input()
            .ok()
            .and_then(|input| {
                Ed25519Provider
                    .verify(&payload.public_key, input.as_bytes(), &token.signature)
                    .ok()
            })
            .unwrap_or(false);
        if !signature_ok {
            return TokenVerification::invalid(InvalidReason::InvalidSignature);
        }

        match derive_user_id(&payload.public_key) {
            Ok(derived) if derived.as_str() == payload.user_id => {}
            _ => return TokenVerification::invalid(InvalidReason::UserIdMismatch),
        }

        if let Some(expected) = self.expected_domain {
            if !expected.eq_ignore_ascii_case(&payload.target_domain) {
                return TokenVerification::invalid(InvalidReason::DomainMismatch);
            }
        }

        TokenVerification::Valid {
            user_id: payload.user_id.clone(),
            public_key: payload.public_key.clone(),
        }
    }
}

impl std::fmt::Debug for SsoTokenVerifier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoTokenVerifier")
            .field("leeway", &self.leeway)
            .field("expected_domain", &self.expected_domain)
            .finish()
    }
}
