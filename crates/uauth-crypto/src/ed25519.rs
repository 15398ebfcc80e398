//! # Ed25519 Provider
//!
//! The primary provider. Key generation, signing, and verification use
//! `ed25519-dalek`; keys are exported in the standard interchange
//! encodings so they are byte-compatible with WebCrypto's
//! `exportKey('spki')` and `exportKey('pkcs8')`:
//!
//! - Public key: DER SubjectPublicKeyInfo, 44 bytes (88 hex chars).
//! - Private key: DER PKCS#8 v1, 48 bytes (96 hex chars).
//!
//! Importing is more lenient than exporting. `sign` also accepts PKCS#8 v2
//! documents and raw 32-byte seeds; `verify` also accepts raw 32-byte
//! public keys.
//!
//! ## Security Invariant
//!
//! An imported `SigningKey` lives only for the duration of one call and is
//! zeroized when dropped.

use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use uauth_core::encoding::{decode_hex, decode_hex_array, to_hex};
use uauth_core::identity::ED25519_SPKI_PREFIX;
use uauth_core::CryptoError;

use crate::keys::PrivateKeyHex;
use crate::provider::{random_secret, CryptoProvider, ExportedKeys, ProviderKind};

/// DER prefix of an Ed25519 PKCS#8 v1 `PrivateKeyInfo` (RFC 8410): the 16
/// bytes that precede the 32-byte seed.
pub const ED25519_PKCS8_V1_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Ed25519 signatures via `ed25519-dalek`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Provider;

impl CryptoProvider for Ed25519Provider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ed25519
    }

    fn generate(&self) -> Result<ExportedKeys, CryptoError> {
        let seed = random_secret()?;
        let signing_key = SigningKey::from_bytes(&seed);
        Ok(ExportedKeys {
            public_key: encode_public_key(&signing_key.verifying_key()),
            private_key: encode_private_key(&signing_key),
        })
    }

    fn sign(&self, private_key: &PrivateKeyHex, message: &[u8]) -> Result<String, CryptoError> {
        let signing_key = decode_private_key(private_key)?;
        Ok(to_hex(signing_key.sign(message).to_bytes()))
    }

    fn verify(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &str,
    ) -> Result<bool, CryptoError> {
        let verifying_key = decode_public_key(public_key)?;
        let sig_bytes: [u8; SIGNATURE_LEN] = decode_hex_array("signature", signature)?;
        let signature = Signature::from_bytes(&sig_bytes);
        Ok(verifying_key.verify(message, &signature).is_ok())
    }

    fn public_key_for(&self, private_key: &PrivateKeyHex) -> Result<String, CryptoError> {
        Ok(encode_public_key(&decode_private_key(private_key)?.verifying_key()))
    }
}

/// Export a verifying key as SPKI DER hex.
pub fn encode_public_key(key: &VerifyingKey) -> String {
    let mut der = Vec::with_capacity(ED25519_SPKI_PREFIX.len() + 32);
    der.extend_from_slice(&ED25519_SPKI_PREFIX);
    der.extend_from_slice(key.as_bytes());
    to_hex(der)
}

/// Export a signing key as PKCS#8 v1 DER hex.
pub fn encode_private_key(key: &SigningKey) -> PrivateKeyHex {
    let mut der = zeroize::Zeroizing::new(Vec::with_capacity(ED25519_PKCS8_V1_PREFIX.len() + 32));
    der.extend_from_slice(&ED25519_PKCS8_V1_PREFIX);
    der.extend_from_slice(key.as_bytes());
    PrivateKeyHex::new(to_hex(&*der))
}

/// Import a public key from SPKI DER hex or a raw 32-byte hex key.
pub fn decode_public_key(hex: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = decode_hex("public key", hex)?;
    match bytes.len() {
        32 => {
            let mut raw = [0u8; 32];
            raw.copy_from_slice(&bytes);
            VerifyingKey::from_bytes(&raw).map_err(|e| {
                CryptoError::MalformedInput(format!("invalid Ed25519 public key: {e}"))
            })
        }
        _ => VerifyingKey::from_public_key_der(&bytes)
            .map_err(|e| {
                CryptoError::MalformedInput(format!(
                    "public key is not an Ed25519 SPKI document: {e}"
                ))
            }),
    }
}

/// Import a private key from PKCS#8 DER hex (v1 or v2) or a raw 32-byte seed.
pub fn decode_private_key(private_key: &PrivateKeyHex) -> Result<SigningKey, CryptoError> {
    let bytes = zeroize::Zeroizing::new(decode_hex("private key", private_key.expose())?);
    match bytes.len() {
        32 => {
            let mut seed = zeroize::Zeroizing::new([0u8; 32]);
            seed.copy_from_slice(&bytes);
            Ok(SigningKey::from_bytes(&seed))
        }
        _ => SigningKey::from_pkcs8_der(&bytes)
            .map_err(|e| {
                CryptoError::MalformedInput(format!(
                    "private key is not an Ed25519 PKCS#8 document: {e}"
                ))
            }),
    }
}

// RFC 8032 §7.1, TEST 1.
const KAT_SECRET: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
const KAT_PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
const KAT_SIGNATURE: &str = concat!(
    "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555",
    "fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b"
);

/// Check that the primitive reproduces the RFC 8032 TEST 1 vector and
/// accepts its own signature.
pub fn known_answer_test() -> Result<(), String> {
    let secret = PrivateKeyHex::new(KAT_SECRET);
    let provider = Ed25519Provider;
    let public = decode_private_key(&secret).map_err(|e| e.to_string())?.verifying_key();
    if to_hex(public.as_bytes()) != KAT_PUBLIC {
        return Err("derived public key does not match RFC 8032 vector".to_string());
    }
    let signature = provider.sign(&secret, b"").map_err(|e| e.to_string())?;
    if signature != KAT_SIGNATURE {
        return Err("signature does not match RFC 8032 vector".to_string());
    }
    match provider.verify(KAT_PUBLIC, b"", &signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err("primitive rejected its own signature".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
