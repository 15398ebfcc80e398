//! # Private Key Sealing
//!
//! Encryption at rest for the persisted private key.
//!
//! - Key derivation: Argon2id over the passphrase with a fresh 16-byte salt
//!   per seal. The cost parameters are stored beside the ciphertext so a
//!   record stays readable if the defaults change.
//! - Cipher: XChaCha20-Poly1305 with a random 24-byte nonce. The record's
//!   `userId` is bound as associated data, so a sealed key cannot be moved
//!   into another identity's record.
//!
//! ## Security Invariant
//!
//! The passphrase and every derived key are zeroized on drop and never
//! appear in `Debug` output.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::StoreError;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;

/// Argon2id memory cost in KiB.
pub const DEFAULT_M_COST: u32 = 19 * 1024;
/// Argon2id iterations.
pub const DEFAULT_T_COST: u32 = 2;
/// Argon2id lanes.
pub const DEFAULT_P_COST: u32 = 1;

/// A sealed secret as persisted, all binary fields hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedSecret {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

/// Passphrase plus the Argon2id cost used for new seals.
#[derive(Clone)]
pub struct SealingKey {
    passphrase: Zeroizing<String>,
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
}

impl SealingKey {
    /// Seal with the default Argon2id cost.
    pub fn from_passphrase(passphrase: impl Into<String>) -> Self {
        Self::with_cost(passphrase, DEFAULT_M_COST, DEFAULT_T_COST, DEFAULT_P_COST)
    }

    /// Seal with an explicit Argon2id cost.
    pub fn with_cost(passphrase: impl Into<String>, m_cost: u32, t_cost: u32, p_cost: u32) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
            m_cost,
            t_cost,
            p_cost,
        }
    }

    /// Encrypt `plaintext`, binding `context` as associated data.
    pub fn seal(&self, plaintext: &[u8], context: &[u8]) -> Result<SealedSecret, StoreError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .and_then(|()| OsRng.try_fill_bytes(&mut nonce))
            .map_err(|e| StoreError::Sealing(format!("OS entropy source failed: {e}")))?;

        let key = self.derive(&salt, self.m_cost, self.t_cost, self.p_cost)?;
        let cipher = Self::cipher(&key)?;
        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), Payload { msg: plaintext, aad: context })
            .map_err(|_| StoreError::Sealing("encryption failed".to_string()))?;

        Ok(SealedSecret {
            m_cost: self.m_cost,
            t_cost: self.t_cost,
            p_cost: self.p_cost,
            salt: hex::encode(salt),
            nonce: hex::encode(nonce),
            ciphertext: hex::encode(ciphertext),
        })
    }

    /// Decrypt a sealed secret. Fails on a wrong passphrase, a different
    /// `context`, or any modified field.
    pub fn unseal(
        &self,
        sealed: &SealedSecret,
        context: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, StoreError> {
        let salt = decode_field::<SALT_LEN>("salt", &sealed.salt)?;
        let nonce = decode_field::<NONCE_LEN>("nonce", &sealed.nonce)?;
        let ciphertext = hex::decode(&sealed.ciphertext)
            .map_err(|_| StoreError::Sealing("ciphertext is not valid hex".to_string()))?;

        let key = self.derive(&salt, sealed.m_cost, sealed.t_cost, sealed.p_cost)?;
        let cipher = Self::cipher(&key)?;
        let plaintext = cipher
            .decrypt(XNonce::from_slice(&nonce), Payload { msg: &ciphertext, aad: context })
            .map_err(|_| {
                StoreError::Sealing(
                    "decryption failed: wrong passphrase or modified record".to_string(),
                )
            })?;
        Ok(Zeroizing::new(plaintext))
    }

    fn cipher(key: &[u8; KEY_LEN]) -> Result<XChaCha20Poly1305, StoreError> {
        XChaCha20Poly1305::new_from_slice(key).map_err(|e| StoreError::Sealing(e.to_string()))
    }

    fn derive(
        &self,
        salt: &[u8],
        m_cost: u32,
        t_cost: u32,
        p_cost: u32,
    ) -> Result<Zeroizing<[u8; KEY_LEN]>, StoreError> {
        let params = Params::new(m_cost, t_cost, p_cost, Some(KEY_LEN))
            .map_err(|e| StoreError::Sealing(format!("invalid Argon2 parameters: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon2
            .hash_password_into(self.passphrase.as_bytes(), salt, &mut key[..])
            .map_err(|e| StoreError::Sealing(format!("key derivation failed: {e}")))?;
        Ok(key)
    }
}

impl std::fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealingKey")
            .field("passphrase", &"<redacted>")
            .field("m_cost", &self.m_cost)
            .field("t_cost", &self.t_cost)
            .field("p_cost", &self.p_cost)
            .finish()
    }
}

fn decode_field<const N: usize>(field: &str, value: &str) -> Result<[u8; N], StoreError> {
    hex::decode(value)
        .ok()
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or_else(|| StoreError::Sealing(format!("{field} must be {N} bytes of hex")))
}
