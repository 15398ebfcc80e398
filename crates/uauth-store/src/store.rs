//! # Identity Store
//!
//! Sole writer of the persisted identity. One record, under one storage key,
//! in one [`KeyValueStore`].
//!
//! ## Read Policy
//!
//! `load_identity` never fails because of what it finds. An absent record,
//! a record that does not parse, a sealed key that will not open, or key
//! material that does not belong to the active provider all load as
//! `Ok(None)` with a warning. Only backend I/O failures are errors.
//!
//! Callers about to write a new identity use `read_record` instead, which
//! reports an unreadable record as [`RecordState::Unreadable`] so it is not
//! mistaken for an empty slot.
//!
//! ## Import Policy
//!
//! An import is validated completely before the single write that persists
//! it. A refused import leaves the stored record untouched.

use std::sync::Arc;

use uauth_core::encoding::decode_hex;
use uauth_core::{derive_user_id, Clock, SystemClock};
use uauth_crypto::{CryptoProvider, KeyPair, PrivateKeyHex};

use crate::backend::KeyValueStore;
use crate::error::{ImportError, StoreError};
use crate::record::{ExportedIdentity, Identity, IdentityRecord, Profile, EXPORT_VERSION};
use crate::sealing::SealingKey;

/// Outcome of reading the identity record.
#[derive(Debug)]
pub enum RecordState {
    /// Nothing is stored.
    Absent,
    /// A record exists but does not parse, will not unseal, or does not
    /// belong to the active provider. It must not be overwritten implicitly.
    Unreadable(String),
    Loaded(Identity),
}

/// Default storage key for the identity record.
pub const DEFAULT_STORAGE_KEY: &str = "universal_auth_identity";

/// Persists, loads, exports, and imports the device identity.
#[derive(Clone)]
pub struct IdentityStore {
    backend: Arc<dyn KeyValueStore>,
    storage_key: String,
    provider: Arc<dyn CryptoProvider>,
    sealing: Option<SealingKey>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityStore")
            .field("backend", &self.backend)
            .field("storage_key", &self.storage_key)
            .field("provider", &self.provider.kind())
            .field("sealing", &self.sealing)
            .finish()
    }
}

impl IdentityStore {
    /// A store over `backend`. Key material is validated against `provider`.
    pub fn new(backend: Arc<dyn KeyValueStore>, provider: Arc<dyn CryptoProvider>) -> Self {
        Self {
            backend,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            provider,
            sealing: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a storage key other than [`DEFAULT_STORAGE_KEY`].
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Seal private keys at rest with this key.
    pub fn with_sealing(mut self, sealing: SealingKey) -> Self {
        self.sealing = Some(sealing);
        self
    }

    /// Clock for `createdAt` and `exportedAt`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn is_sealed(&self) -> bool {
        self.sealing.is_some()
    }

    /// Persist `key_pair` with `profile`, stamped with the current time.
    pub fn store_new(&self, key_pair: KeyPair, profile: Profile) -> Result<Identity, StoreError> {
        let identity = Identity::new(key_pair, profile, self.clock.now());
        self.store_identity(&identity)?;
        Ok(identity)
    }

    /// Persist an identity, replacing any stored one.
    pub fn store_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        let pair = &identity.key_pair;
        let (private_key, sealed_private_key) = match &self.sealing {
            Some(sealing) => {
                let plaintext = pair.private_key.expose().as_bytes();
                let sealed = sealing.seal(plaintext, pair.user_id.as_str().as_bytes())?;
                (None, Some(sealed))
            }
            None => {
                tracing::warn!(
                    user_id = %pair.user_id,
                    "storing private key unsealed; set a passphrase to encrypt it at rest"
                );
                (Some(pair.private_key.expose().to_string()), None)
            }
        };
        let record = IdentityRecord {
            user_id: pair.user_id.clone(),
            public_key: pair.public_key.clone(),
            private_key,
            sealed_private_key,
            profile: identity.profile.clone(),
            created_at: identity.created_at,
        };
        let json = zeroize::Zeroizing::new(serde_json::to_string(&record)?);
        self.backend.put(&self.storage_key, &json)?;
        tracing::info!(user_id = %pair.user_id, sealed = self.is_sealed(), "stored identity");
        Ok(())
    }

    /// Load the stored identity, or `None` if there is none usable.
    pub fn load_identity(&self) -> Result<Option<Identity>, StoreError> {
        match self.read_record()? {
            RecordState::Loaded(identity) => Ok(Some(identity)),
            RecordState::Absent | RecordState::Unreadable(_) => Ok(None),
        }
    }

    /// What sits under the storage key, distinguishing an absent record from
    /// one that exists but cannot be opened.
    pub fn read_record(&self) -> Result<RecordState, StoreError> {
        let Some(raw) = self.backend.get(&self.storage_key)? else {
            tracing::debug!(key = %self.storage_key, "no stored identity");
            return Ok(RecordState::Absent);
        };
        let raw = zeroize::Zeroizing::new(raw);

        let record: IdentityRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %self.storage_key, error = %e, "stored identity is corrupt");
                return Ok(RecordState::Unreadable(format!("record does not parse: {e}")));
            }
        };

        match self.open_record(record) {
            Ok(identity) => {
                tracing::debug!(user_id = %identity.key_pair.user_id, "loaded identity");
                Ok(RecordState::Loaded(identity))
            }
            Err(reason) => {
                tracing::warn!(key = %self.storage_key, %reason, "stored identity is unusable");
                Ok(RecordState::Unreadable(reason))
            }
        }
    }

    fn open_record(&self, record: IdentityRecord) -> Result<Identity, String> {
        let private_key = match (&record.private_key, &record.sealed_private_key, &self.sealing) {
            (_, Some(sealed), Some(sealing)) => {
                let bytes = sealing
                    .unseal(sealed, record.user_id.as_str().as_bytes())
                    .map_err(|e| e.to_string())?;
                let hex = std::str::from_utf8(&bytes)
                    .map_err(|_| "sealed key is not text".to_string())?;
                PrivateKeyHex::new(hex)
            }
            (_, Some(_), None) => {
                return Err("record is sealed and no passphrase is configured".to_string())
            }
            (Some(plain), None, _) => PrivateKeyHex::new(plain.as_str()),
            (None, None, _) => return Err("record has no private key".to_string()),
        };

        let public_key = self.provider.public_key_for(&private_key).map_err(|e| e.to_string())?;
        if !public_key.eq_ignore_ascii_case(record.public_key.trim()) {
            return Err("private key does not match public key".to_string());
        }
        let user_id = derive_user_id(&public_key).map_err(|e| e.to_string())?;
        if user_id != record.user_id {
            return Err("userId does not match public key".to_string());
        }

        Ok(Identity::new(
            KeyPair {
                public_key,
                private_key,
                user_id,
                is_fallback: self.provider.is_fallback(),
            },
            record.profile,
            record.created_at,
        ))
    }

    /// Produce a backup of the stored identity.
    pub fn export_identity(&self) -> Result<ExportedIdentity, StoreError> {
        let identity = self.load_identity()?.ok_or(StoreError::NotFound)?;
        Ok(self.export(&identity))
    }

    /// Produce a backup of `identity`.
    pub fn export(&self, identity: &Identity) -> ExportedIdentity {
        let pair = &identity.key_pair;
        tracing::info!(user_id = %pair.user_id, "exported identity");
        ExportedIdentity {
            version: EXPORT_VERSION,
            user_id: pair.user_id.to_string(),
            public_key: pair.public_key.clone(),
            private_key: pair.private_key.expose().to_string(),
            exported_at: self.clock.now(),
        }
    }

    /// Validate and persist an exported identity.
    pub fn import_identity(&self, json: &str) -> Result<Identity, ImportError> {
        let identity = self.validate_import(json)?;
        self.store_identity(&identity)?;
        tracing::info!(user_id = %identity.key_pair.user_id, "imported identity");
        Ok(identity)
    }

    /// Validate an exported identity without persisting it.
    pub fn validate_import(&self, json: &str) -> Result<Identity, ImportError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ImportError::InvalidJson(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| ImportError::InvalidJson("expected a JSON object".to_string()))?;

        let version = match object.get("version") {
            None => EXPORT_VERSION,
            Some(v) => v.as_u64().ok_or(ImportError::UnsupportedVersion(0))?,
        };
        if version != EXPORT_VERSION {
            return Err(ImportError::UnsupportedVersion(version));
        }

        let field = |name: &'static str| {
            object
                .get(name)
                .and_then(serde_json::Value::as_str)
                .ok_or(ImportError::MissingField(name))
        };
        let user_id = field("userId")?;
        let public_key = field("publicKey")?;
        let private_key = PrivateKeyHex::new(field("privateKey")?);

        let hex_fields = [
            ("userId", user_id),
            ("publicKey", public_key),
            ("privateKey", private_key.expose()),
        ];
        for (name, value) in hex_fields {
            if decode_hex(name, value).is_err() {
                return Err(ImportError::MalformedHex { field: name });
            }
        }

        let derived_public = self
            .provider
            .public_key_for(&private_key)
            .map_err(ImportError::InvalidKey)?;
        if !derived_public.eq_ignore_ascii_case(public_key.trim()) {
            return Err(ImportError::KeyMismatch);
        }
        let derived_id = derive_user_id(&derived_public).map_err(ImportError::InvalidKey)?;
        if !derived_id.as_str().eq_ignore_ascii_case(user_id.trim()) {
            return Err(ImportError::UserIdMismatch);
        }

        Ok(Identity::new(
            KeyPair {
                public_key: derived_public,
                private_key,
                user_id: derived_id,
                is_fallback: self.provider.is_fallback(),
            },
            Profile::default(),
            self.clock.now(),
        ))
    }

    /// Remove the stored identity.
    pub fn clear_identity(&self) -> Result<(), StoreError> {
        self.backend.remove(&self.storage_key)?;
        tracing::info!(key = %self.storage_key, "cleared stored identity");
        Ok(())
    }
}
