//! # Digest Fallback Provider
//!
//! Used only when Ed25519 cannot be used on the host. It is an integrity
//! checksum, not a signature scheme:
//!
//! - private key: 32 random bytes
//! - public key: `SHA-256(private key)`
//! - signature: `SHA-256(public key ‖ message)`
//!
//! The pair is related, so `verify(m, sign(m, sk), pk)` holds, but anyone
//! who knows the public key can produce a "signature". Every caller sees
//! `is_fallback() == true` and token issuance refuses to run on it.

use sha2::{Digest, Sha256};
use uauth_core::encoding::{decode_hex_array, to_hex};
use uauth_core::CryptoError;

use crate::keys::PrivateKeyHex;
use crate::provider::{random_secret, CryptoProvider, ExportedKeys, ProviderKind};

const KEY_LEN: usize = 32;
const DIGEST_LEN: usize = 32;

/// SHA-256 checksum provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestFallbackProvider;

impl DigestFallbackProvider {
    fn public_from_secret(secret: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
        Sha256::digest(secret).into()
    }

    fn checksum(public: &[u8; KEY_LEN], message: &[u8]) -> [u8; DIGEST_LEN] {
        let mut hasher = Sha256::new();
        hasher.update(public);
        hasher.update(message);
        hasher.finalize().into()
    }

    fn decode_secret(
        private_key: &PrivateKeyHex,
    ) -> Result<zeroize::Zeroizing<[u8; KEY_LEN]>, CryptoError> {
        Ok(zeroize::Zeroizing::new(decode_hex_array("private key", private_key.expose())?))
    }
}

impl CryptoProvider for DigestFallbackProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DigestFallback
    }

    fn generate(&self) -> Result<ExportedKeys, CryptoError> {
        let secret = random_secret()?;
        let public = Self::public_from_secret(&secret);
        Ok(ExportedKeys {
            public_key: to_hex(public),
            private_key: PrivateKeyHex::new(to_hex(&secret[..])),
        })
    }

    fn sign(&self, private_key: &PrivateKeyHex, message: &[u8]) -> Result<String, CryptoError> {
        let secret = Self::decode_secret(private_key)?;
        let public = Self::public_from_secret(&secret);
        Ok(to_hex(Self::checksum(&public, message)))
    }

    fn verify(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &str,
    ) -> Result<bool, CryptoError> {
        let public: [u8; KEY_LEN] = decode_hex_array("public key", public_key)?;
        let claimed: [u8; DIGEST_LEN] = decode_hex_array("signature", signature)?;
        let expected = Self::checksum(&public, message);
        Ok(expected == claimed)
    }

    fn public_key_for(&self, private_key: &PrivateKeyHex) -> Result<String, CryptoError> {
        let secret = Self::decode_secret(private_key)?;
        Ok(to_hex(Self::public_from_secret(&secret)))
    }
}
