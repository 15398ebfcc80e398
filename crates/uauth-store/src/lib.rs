//! # uauth-store: Identity Persistence
//!
//! Keeps one identity per device in a [`KeyValueStore`], and moves it
//! between devices through a versioned export blob.
//!
//! Private keys are sealed at rest when a [`SealingKey`] is configured
//! (Argon2id + XChaCha20-Poly1305). Without one the record holds the key in
//! plaintext and every write logs a warning.

pub mod backend;
pub mod error;
pub mod record;
pub mod sealing;
pub mod store;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use error::{ImportError, StoreError};
pub use record::{ExportedIdentity, Identity, IdentityRecord, Profile, EXPORT_VERSION};
pub use sealing::{SealedSecret, SealingKey};
pub use store::{IdentityStore, RecordState, DEFAULT_STORAGE_KEY};
