//! # Persisted and Exported Shapes
//!
//! [`IdentityRecord`] is what sits in local storage:
//!
//! ```json
//! {"userId":"..","publicKey":"..","privateKey":"..",
//!  "email":"..","name":"..","createdAt":1767225600000}
//! ```
//!
//! With sealing enabled `privateKey` is replaced by `sealedPrivateKey`.
//!
//! [`ExportedIdentity`] is the versioned backup blob. It carries the private
//! key in plaintext and must be handled as a bearer secret.

use serde::{Deserialize, Serialize};
use uauth_core::{EpochMillis, UserId};
use uauth_crypto::KeyPair;

use crate::sealing::SealedSecret;

/// Export format version written by this crate.
pub const EXPORT_VERSION: u64 = 1;

/// Optional profile fields kept beside the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An identity as the rest of the workspace sees it.
#[derive(Debug, Clone)]
pub struct Identity {
    pub key_pair: KeyPair,
    pub profile: Profile,
    pub created_at: EpochMillis,
}

impl Identity {
    pub fn new(key_pair: KeyPair, profile: Profile, created_at: EpochMillis) -> Self {
        Self {
            key_pair,
            profile,
            created_at,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.key_pair.user_id
    }

    pub fn public_key(&self) -> &str {
        &self.key_pair.public_key
    }
}

/// The persisted record.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub user_id: UserId,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sealed_private_key: Option<SealedSecret>,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: EpochMillis,
}

impl std::fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("user_id", &self.user_id)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("sealed", &self.sealed_private_key.is_some())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Versioned backup blob.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedIdentity {
    pub version: u64,
    pub user_id: String,
    pub public_key: String,
    pub private_key: String,
    pub exported_at: EpochMillis,
}

impl ExportedIdentity {
    /// Pretty-printed JSON, as written to backup files.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Debug for ExportedIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedIdentity")
            .field("version", &self.version)
            .field("user_id", &self.user_id)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("exported_at", &self.exported_at)
            .finish()
    }
}
