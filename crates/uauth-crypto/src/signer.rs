//! # Message Signing and Verification
//!
//! String messages are signed over their UTF-8 bytes on both paths.
//! `SignatureVerifier::verify` returns `Ok(false)` for any mismatch and
//! `Err(CryptoError::MalformedInput)` only for structurally invalid key or
//! signature material.
//!
//! Signatures from the digest fallback are returned with `is_fallback` set;
//! callers decide whether to trust them.

use uauth_core::CryptoError;

use crate::keys::{KeyPair, PrivateKeyHex};
use crate::provider::CryptoProvider;

/// A hex signature and whether a degraded provider produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSignature {
    /// Hex-encoded signature.
    pub signature: String,
    /// True when the digest fallback produced this value.
    pub is_fallback: bool,
}

/// Signs messages with the selected provider.
#[derive(Debug, Clone, Copy)]
pub struct MessageSigner<'a> {
    provider: &'a dyn CryptoProvider,
}

impl<'a> MessageSigner<'a> {
    pub fn new(provider: &'a dyn CryptoProvider) -> Self {
        Self { provider }
    }

    /// Sign `message` with a hex private key.
    pub fn sign(
        &self,
        message: &str,
        private_key: &PrivateKeyHex,
    ) -> Result<MessageSignature, CryptoError> {
        let signature = self.provider.sign(private_key, message.as_bytes())?;
        Ok(MessageSignature {
            signature,
            is_fallback: self.provider.is_fallback(),
        })
    }

    /// Sign `message` with a generated key pair.
    pub fn sign_with(
        &self,
        message: &str,
        key_pair: &KeyPair,
    ) -> Result<MessageSignature, CryptoError> {
        self.sign(message, &key_pair.private_key)
    }
}

/// Verifies message signatures with the selected provider.
#[derive(Debug, Clone, Copy)]
pub struct SignatureVerifier<'a> {
    provider: &'a dyn CryptoProvider,
}

impl<'a> SignatureVerifier<'a> {
    pub fn new(provider: &'a dyn CryptoProvider) -> Self {
        Self { provider }
    }

    /// Check a hex signature over `message` against a hex public key.
    pub fn verify(
        &self,
        message: &str,
        signature: &str,
        public_key: &str,
    ) -> Result<bool, CryptoError> {
        self.provider.verify(public_key, message.as_bytes(), signature)
    }
}
