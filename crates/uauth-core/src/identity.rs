//! # User Identifiers
//!
//! A `UserId` is never assigned. It is a 64-bit truncation of the identity's
//! public key, rendered as 16 lowercase hex characters, and every party that
//! holds the public key can recompute it.
//!
//! ## Derivation
//!
//! Primary-provider public keys travel as DER SubjectPublicKeyInfo. The SPKI
//! header is the same 12 bytes for every Ed25519 key, so the identifier is
//! taken from the embedded 32-byte key rather than from the start of the
//! document. Keys in any other encoding (the fallback provider's raw keys)
//! are truncated as-is.
//!
//! ## Collision Boundary
//!
//! 64 bits is a birthday bound of roughly 2^32 identities. Below that scale
//! collisions are negligible; above it, callers must not treat a `UserId` as
//! unique. See [`collision_probability`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::encoding::{decode_hex, to_hex};
use crate::error::CryptoError;

/// Length of a user identifier in hex characters.
pub const USER_ID_HEX_LEN: usize = 16;

/// Number of public-key bits a user identifier retains.
pub const USER_ID_BITS: u32 = 64;

/// DER prefix of an Ed25519 SubjectPublicKeyInfo (RFC 8410): the 12 bytes
/// that precede the 32-byte key.
pub const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// Identifier derived from a public key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse an identifier that was derived elsewhere.
    ///
    /// Accepts exactly 16 hex characters and normalizes to lowercase.
    pub fn parse(s: &str) -> Result<Self, CryptoError> {
        let s = s.trim();
        if s.len() != USER_ID_HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CryptoError::MalformedInput(format!(
                "user id must be {USER_ID_HEX_LEN} hex chars, got {s:?}"
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The identifier as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the user identifier for a hex-encoded public key.
///
/// Pure: the same key always yields the same identifier, on every device and
/// in every component that recomputes it.
pub fn derive_user_id(public_key_hex: &str) -> Result<UserId, CryptoError> {
    let bytes = decode_hex("public key", public_key_hex)?;
    let key_material = bytes.strip_prefix(&ED25519_SPKI_PREFIX[..]).unwrap_or(&bytes[..]);
    let id_len = USER_ID_HEX_LEN / 2;
    if key_material.len() < id_len {
        return Err(CryptoError::MalformedInput(format!(
            "public key too short to derive a user id: {} bytes",
            key_material.len()
        )));
    }
    Ok(UserId(to_hex(&key_material[..id_len])))
}

/// Probability that at least two of `identities` derived identifiers collide.
///
/// Birthday approximation `1 - exp(-n² / 2^(bits+1))`.
pub fn collision_probability(identities: f64) -> f64 {
    let space = 2f64.powi(USER_ID_BITS as i32 + 1);
    -(-(identities * identities) / space).exp_m1()
}
