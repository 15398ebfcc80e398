//! # SSO Token Wire Format
//!
//! ```text
//! base64( JSON( { "payload": { userId, publicKey, targetDomain, timestamp, expiresAt },
//!                 "signature": hex } ) )
//! ```
//!
//! `timestamp` and `expiresAt` are integer epoch milliseconds. The signature
//! covers the JCS canonical form of `payload` (sorted keys, no whitespace),
//! so issuer and verifier agree on the signed bytes regardless of the field
//! order the envelope arrived in.
//!
//! Encoding uses the standard base64 alphabet with padding. Decoding also
//! accepts the URL-safe alphabet, with or without padding, since tokens are
//! commonly carried in query strings.

use std::time::Duration;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use uauth_core::{CanonicalBytes, CanonicalizationError, EpochMillis};

/// Validity window of an issued token.
pub const TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// The signed assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoPayload {
    /// Identifier of the issuing identity.
    pub user_id: String,
    /// Issuer's public key (SPKI DER hex).
    pub public_key: String,
    /// Origin the token is intended for.
    pub target_domain: String,
    /// Issuance time.
    pub timestamp: EpochMillis,
    /// `timestamp + TOKEN_TTL`.
    pub expires_at: EpochMillis,
}

impl SsoPayload {
    /// The bytes the signature covers.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }
}

/// Payload plus signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoToken {
    pub payload: SsoPayload,
    /// Hex signature over `payload.signing_input()`.
    pub signature: String,
}

/// Why a token string could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum TokenDecodeError {
    #[error("token is not valid base64")]
    Base64,
    #[error("token is not a valid envelope: {0}")]
    Json(#[from] serde_json::Error),
}

impl SsoToken {
    /// Serialize the envelope and base64-encode it.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }

    /// Reverse of [`encode`](Self::encode).
    pub fn decode(token: &str) -> Result<Self, TokenDecodeError> {
        let token = token.trim();
        let bytes = match STANDARD.decode(token) {
            Ok(bytes) => bytes,
            Err(_) => URL_SAFE_NO_PAD
                .decode(token.trim_end_matches('='))
                .map_err(|_| TokenDecodeError::Base64)?,
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SsoToken {
        SsoToken {
            payload: SsoPayload {
                user_id: "0123456789abcdef".to_string(),
                public_key: "ab".repeat(44),
                target_domain: "example.com".to_string(),
                timestamp: EpochMillis::new(1_000),
                expires_at: EpochMillis::new(1_000 + 900_000),
            },
            signature: "cd".repeat(64),
        }
    }

    #[test]
    fn ttl_is_fifteen_minutes() {
        assert_eq!(TOKEN_TTL.as_millis(), 900_000);
    }

    #[test]
    fn payload_uses_wire_field_names() {
        let json = serde_json::to_value(&sample()).unwrap();
        let payload = json["payload"].as_object().unwrap();
        let mut keys: Vec<_> = payload.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["expiresAt", "publicKey", "targetDomain", "timestamp", "userId"]);
        assert!(payload["timestamp"].is_i64());
        assert!(json["signature"].is_string());
    }

    #[test]
    fn signing_input_is_sorted_and_compact() {
        let bytes = sample().payload.signing_input().unwrap();
        let text = std::str::from_utf8(bytes.as_bytes()).unwrap();
        assert!(text.starts_with(r#"{"expiresAt":901000,"publicKey":""#));
        assert!(!text.contains(' '));
    }

    #[test]
    fn encoded_token_is_standard_base64_json() {
        let encoded = sample().encode().unwrap();
        let bytes = STANDARD.decode(&encoded).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["payload"]["targetDomain"], "example.com");
        assert_eq!(SsoToken::decode(&encoded).unwrap(), sample());
    }

    #[test]
    fn url_safe_form_decodes() {
        let json = serde_json::to_vec(&sample()).unwrap();
        let encoded = URL_SAFE_NO_PAD.encode(json);
        assert_eq!(SsoToken::decode(&encoded).unwrap(), sample());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(SsoToken::decode("!!!"), Err(TokenDecodeError::Base64)));
        let not_json = STANDARD.encode("hello");
        assert!(matches!(SsoToken::decode(&not_json), Err(TokenDecodeError::Json(_))));
        let missing_field = STANDARD.encode(r#"{"payload":{"userId":"x"},"signature":"00"}"#);
        assert!(SsoToken::decode(&missing_field).is_err());
    }

    #[test]
    fn float_timestamps_are_rejected() {
        let raw = concat!(
            r#"{"payload":{"userId":"a","publicKey":"b","targetDomain":"c","#,
            r#""timestamp":1.5,"expiresAt":2},"signature":"00"}"#
        );
        assert!(SsoToken::decode(&STANDARD.encode(raw)).is_err());
    }
}
