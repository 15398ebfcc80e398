//! # Key Material
//!
//! Exported key material as it leaves a provider: hex strings in the
//! provider's interchange encoding, plus the identifier derived from the
//! public half.
//!
//! ## Security Invariant
//!
//! - `PrivateKeyHex` zeroizes its buffer on drop and never prints its
//!   contents through `Debug` or `Display`.
//! - `KeyPair` does not implement `Serialize`. Persisting a private key is
//!   the identity store's decision, made explicitly via
//!   [`PrivateKeyHex::expose`].

use uauth_core::UserId;
use zeroize::Zeroizing;

/// A hex-encoded private key.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKeyHex(Zeroizing<String>);

impl PrivateKeyHex {
    /// Wrap a hex string. Normalized to trimmed lowercase; validation happens
    /// where the key is imported into a provider.
    pub fn new(hex: impl Into<String>) -> Self {
        let raw: Zeroizing<String> = Zeroizing::new(hex.into());
        Self(Zeroizing::new(raw.trim().to_ascii_lowercase()))
    }

    /// Borrow the hex string. Callers must not log it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PrivateKeyHex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKeyHex(<redacted>)")
    }
}

/// Output of key generation: both halves, the derived identifier, and
/// whether a degraded provider produced them.
#[derive(Clone)]
pub struct KeyPair {
    /// Hex-encoded public key in the provider's interchange encoding.
    pub public_key: String,
    /// Hex-encoded private key in the provider's interchange encoding.
    pub private_key: PrivateKeyHex,
    /// `derive_user_id(public_key)`.
    pub user_id: UserId,
    /// True when the digest fallback produced this pair.
    pub is_fallback: bool,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("user_id", &self.user_id)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key)
            .field("is_fallback", &self.is_fallback)
            .finish()
    }
}
