//! # Identity Context
//!
//! One object owns everything an identity operation needs: the provider
//! chosen at construction, the identity store, the clock, and the in-memory
//! identity. It is passed to callers explicitly; there is no global.
//!
//! ## Initialization Guard
//!
//! The in-memory identity sits behind a `tokio::sync::OnceCell`. The first
//! caller of [`IdentityContext::identity`] loads or generates it; every
//! concurrent caller awaits that same initialization and receives the same
//! `Arc<Identity>`.
//!
//! Replacing the identity ([`regenerate`](IdentityContext::regenerate),
//! [`import_identity`](IdentityContext::import_identity),
//! [`clear`](IdentityContext::clear)) takes `&mut self`. While any task
//! holds a shared reference, the identity cannot change underneath it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use uauth_core::{Clock, SystemClock};
use uauth_crypto::{
    detect_provider, generate_key_pair, select_provider, CapabilityProbe, CryptoProvider, HostProbe,
    MessageSignature, MessageSigner, ProviderKind, ProviderSelection, SignatureVerifier,
};
use uauth_sso::{SsoTokenIssuer, SsoTokenVerifier, TokenVerification};
use uauth_store::{
    ExportedIdentity, FileStore, Identity, IdentityStore, Profile, RecordState, SealingKey,
};

use crate::config::AuthConfig;
use crate::error::ContextError;

/// Device identity and the machinery around it.
pub struct IdentityContext {
    selection: ProviderSelection,
    provider: Arc<dyn CryptoProvider>,
    store: IdentityStore,
    clock: Arc<dyn Clock>,
    clock_leeway: Duration,
    profile: Profile,
    identity: OnceCell<Arc<Identity>>,
}

impl IdentityContext {
    /// Build a context from configuration, probing the host for a provider.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ContextError> {
        Self::from_config_with_probe(config, &HostProbe)
    }

    /// Build a context from configuration with an explicit capability probe.
    pub fn from_config_with_probe(
        config: &AuthConfig,
        probe: &dyn CapabilityProbe,
    ) -> Result<Self, ContextError> {
        let selection = detect_provider(config.provider, probe);
        let provider: Arc<dyn CryptoProvider> = Arc::from(select_provider(&selection)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let backend = Arc::new(FileStore::new(&config.storage_dir));
        let mut store = IdentityStore::new(backend, provider.clone())
            .with_storage_key(config.storage_key.as_str())
            .with_clock(clock.clone());
        if let Some(passphrase) = &config.passphrase {
            store = store.with_sealing(SealingKey::from_passphrase(passphrase.as_str()));
        }

        tracing::debug!(
            storage_dir = %config.storage_dir.display(),
            provider = %provider.kind(),
            sealed = store.is_sealed(),
            "identity context ready"
        );

        Ok(Self {
            selection,
            provider,
            store,
            clock,
            clock_leeway: config.clock_leeway,
            profile: Profile::default(),
            identity: OnceCell::new(),
        })
    }

    /// Build a context from parts.
    pub fn new(provider: Arc<dyn CryptoProvider>, store: IdentityStore) -> Self {
        let selection = if provider.is_fallback() {
            ProviderSelection::FallbackRequired {
                reason: "fallback provider supplied".to_string(),
            }
        } else {
            ProviderSelection::PrimaryAvailable
        };
        Self {
            selection,
            provider,
            store,
            clock: Arc::new(SystemClock),
            clock_leeway: Duration::ZERO,
            profile: Profile::default(),
            identity: OnceCell::new(),
        }
    }

    /// Clock used for token issuance and verification.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Extra validity accepted when verifying tokens.
    pub fn with_clock_leeway(mut self, leeway: Duration) -> Self {
        self.clock_leeway = leeway;
        self
    }

    /// Profile attached to identities this context generates.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn selection(&self) -> &ProviderSelection {
        &self.selection
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    /// True when the digest fallback is active.
    pub fn is_fallback(&self) -> bool {
        self.provider.is_fallback()
    }

    pub fn store(&self) -> &IdentityStore {
        &self.store
    }

    /// The identity, loading it from the store or generating one on first
    /// use. A stored record that cannot be opened is never overwritten here;
    /// it fails with [`ContextError::IdentityUnreadable`].
    pub async fn identity(&self) -> Result<Arc<Identity>, ContextError> {
        self.identity
            .get_or_try_init(|| async { self.load_or_generate() })
            .await
            .cloned()
    }

    /// The identity if one exists, without generating.
    pub async fn existing_identity(&self) -> Result<Arc<Identity>, ContextError> {
        self.identity
            .get_or_try_init(|| async { self.load_existing() })
            .await
            .cloned()
    }

    /// Whether an identity is loaded in memory.
    pub fn is_initialized(&self) -> bool {
        self.identity.initialized()
    }

    /// Replace the identity with a freshly generated one.
    pub fn regenerate(&mut self) -> Result<Arc<Identity>, ContextError> {
        let previous = self.identity.get().map(|i| i.user_id().clone());
        let created = Arc::new(self.generate_and_store()?);
        tracing::warn!(
            previous = ?previous.as_ref().map(|id| id.as_str()),
            user_id = %created.user_id(),
            "regenerated identity"
        );
        self.identity = OnceCell::from(created.clone());
        Ok(created)
    }

    /// Validate and adopt an exported identity.
    pub fn import_identity(&mut self, json: &str) -> Result<Arc<Identity>, ContextError> {
        let imported = Arc::new(self.store.import_identity(json)?);
        self.identity = OnceCell::from(imported.clone());
        Ok(imported)
    }

    /// Delete the stored identity and forget the in-memory one.
    pub fn clear(&mut self) -> Result<(), ContextError> {
        self.store.clear_identity()?;
        self.identity = OnceCell::new();
        Ok(())
    }

    /// Backup of the current identity.
    pub async fn export_identity(&self) -> Result<ExportedIdentity, ContextError> {
        let identity = self.existing_identity().await?;
        Ok(self.store.export(&identity))
    }

    /// Sign a message with the current identity.
    pub async fn sign(&self, message: &str) -> Result<MessageSignature, ContextError> {
        let identity = self.existing_identity().await?;
        Ok(MessageSigner::new(self.provider.as_ref()).sign_with(message, &identity.key_pair)?)
    }

    /// Check a signature with the active provider.
    pub fn verify(
        &self,
        message: &str,
        signature: &str,
        public_key: &str,
    ) -> Result<bool, ContextError> {
        Ok(SignatureVerifier::new(self.provider.as_ref()).verify(message, signature, public_key)?)
    }

    /// Issue an SSO token for `target_domain`.
    pub async fn issue_token(&self, target_domain: &str) -> Result<String, ContextError> {
        let identity = self.existing_identity().await?;
        let token = SsoTokenIssuer::new(self.provider.as_ref(), self.clock.as_ref())
            .with_identity(&identity.key_pair)
            .issue(target_domain)?;
        Ok(token)
    }

    /// Verify an SSO token against this context's clock and leeway.
    pub fn verify_token(&self, token: &str) -> TokenVerification {
        self.verifier().verify(token)
    }

    /// Verify an SSO token and require it to name `domain`.
    pub fn verify_token_for(&self, token: &str, domain: &str) -> TokenVerification {
        self.verifier().with_expected_domain(domain).verify(token)
    }

    fn verifier(&self) -> SsoTokenVerifier<'_> {
        SsoTokenVerifier::new(self.clock.as_ref()).with_leeway(self.clock_leeway)
    }

    fn load_or_generate(&self) -> Result<Arc<Identity>, ContextError> {
        match self.store.read_record()? {
            RecordState::Loaded(existing) => {
                tracing::info!(user_id = %existing.user_id(), "loaded identity");
                Ok(Arc::new(existing))
            }
            RecordState::Unreadable(reason) => Err(ContextError::IdentityUnreadable(reason)),
            RecordState::Absent => {
                let created = self.generate_and_store()?;
                tracing::info!(
                    user_id = %created.user_id(),
                    fallback = self.is_fallback(),
                    "generated identity"
                );
                Ok(Arc::new(created))
            }
        }
    }

    fn load_existing(&self) -> Result<Arc<Identity>, ContextError> {
        match self.store.read_record()? {
            RecordState::Loaded(existing) => Ok(Arc::new(existing)),
            RecordState::Unreadable(reason) => Err(ContextError::IdentityUnreadable(reason)),
            RecordState::Absent => Err(ContextError::NoIdentity),
        }
    }

    fn generate_and_store(&self) -> Result<Identity, ContextError> {
        let key_pair = generate_key_pair(self.provider.as_ref())?;
        Ok(self.store.store_new(key_pair, self.profile.clone())?)
    }
}

impl std::fmt::Debug for IdentityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityContext")
            .field("provider", &self.provider.kind())
            .field("store", &self.store)
            .field("clock_leeway", &self.clock_leeway)
            .field("user_id", &self.identity.get().map(|i| i.user_id().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uauth_core::{CryptoError, EpochMillis, ManualClock};
    use uauth_crypto::{DigestFallbackProvider, Ed25519Provider, ExportedKeys, PrivateKeyHex};
    use uauth_sso::InvalidReason;
    use uauth_store::{KeyValueStore, MemoryStore, DEFAULT_STORAGE_KEY};

    #[derive(Debug, Default)]
    struct CountingProvider {
        generated: AtomicUsize,
    }

    impl CryptoProvider for CountingProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Ed25519
        }
        fn generate(&self) -> Result<ExportedKeys, CryptoError> {
            self.generated.fetch_add(1, Ordering::SeqCst);
            Ed25519Provider.generate()
        }
        fn sign(&self, sk: &PrivateKeyHex, m: &[u8]) -> Result<String, CryptoError> {
            Ed25519Provider.sign(sk, m)
        }
        fn verify(&self, pk: &str, m: &[u8], sig: &str) -> Result<bool, CryptoError> {
            Ed25519Provider.verify(pk, m, sig)
        }
        fn public_key_for(&self, sk: &PrivateKeyHex) -> Result<String, CryptoError> {
            Ed25519Provider.public_key_for(sk)
        }
    }

    fn context_over(
        provider: Arc<dyn CryptoProvider>,
        backend: Arc<dyn KeyValueStore>,
    ) -> IdentityContext {
        IdentityContext::new(provider.clone(), IdentityStore::new(backend, provider))
    }

    fn memory_context() -> IdentityContext {
        memory_context_over(Arc::new(MemoryStore::new()))
    }

    fn memory_context_over(backend: Arc<dyn KeyValueStore>) -> IdentityContext {
        context_over(Arc::new(Ed25519Provider), backend)
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_generation() {
        let provider = Arc::new(CountingProvider::default());
        let ctx = Arc::new(context_over(provider.clone(), Arc::new(MemoryStore::new())));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ctx = ctx.clone();
                tokio::spawn(async move { ctx.identity().await.unwrap().user_id().clone() })
            })
            .collect();
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        assert_eq!(provider.generated.load(Ordering::SeqCst), 1);
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn identity_is_loaded_not_regenerated() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = memory_context_over(backend.clone()).identity().await.unwrap();
        let second = memory_context_over(backend).identity().await.unwrap();
        assert_eq!(first.user_id(), second.user_id());
        assert_eq!(first.key_pair.private_key, second.key_pair.private_key);
    }

    #[tokio::test]
    async fn signing_and_tokens_require_existing_identity() {
        let ctx = memory_context();
        assert!(matches!(ctx.sign("m").await, Err(ContextError::NoIdentity)));
        assert!(matches!(ctx.issue_token("example.com").await, Err(ContextError::NoIdentity)));
        assert!(matches!(ctx.export_identity().await, Err(ContextError::NoIdentity)));
        assert!(!ctx.is_initialized());
    }

    #[tokio::test]
    async fn sign_and_verify_through_context() {
        let ctx = memory_context();
        let identity = ctx.identity().await.unwrap();
        let sig = ctx.sign("hello").await.unwrap();
        assert!(!sig.is_fallback);
        assert!(ctx.verify("hello", &sig.signature, identity.public_key()).unwrap());
        assert!(!ctx.verify("hullo", &sig.signature, identity.public_key()).unwrap());
    }

    #[tokio::test]
    async fn token_handshake_through_context() {
        let clock = Arc::new(ManualClock::new(EpochMillis::new(1_767_225_600_000)));
        let ctx = memory_context().with_clock(clock.clone());
        let identity = ctx.identity().await.unwrap();

        let token = ctx.issue_token("example.com").await.unwrap();
        match ctx.verify_token(&token) {
            TokenVerification::Valid { user_id, .. } => {
                assert_eq!(user_id, identity.user_id().as_str())
            }
            other => panic!("{other:?}"),
        }
        assert_eq!(
            ctx.verify_token_for(&token, "other.com").reason(),
            Some(InvalidReason::DomainMismatch)
        );

        clock.advance(Duration::from_secs(15 * 60 + 1));
        assert_eq!(ctx.verify_token(&token).reason(), Some(InvalidReason::Expired));
    }

    #[tokio::test]
    async fn leeway_applies_to_context_verification() {
        let clock = Arc::new(ManualClock::new(EpochMillis::new(1_767_225_600_000)));
        let ctx = memory_context()
            .with_clock(clock.clone())
            .with_clock_leeway(Duration::from_secs(30));
        ctx.identity().await.unwrap();
        let token = ctx.issue_token("example.com").await.unwrap();
        clock.advance(Duration::from_secs(15 * 60 + 10));
        assert!(ctx.verify_token(&token).is_valid());
    }

    #[tokio::test]
    async fn fallback_context_flags_signatures_and_refuses_tokens() {
        let ctx = context_over(Arc::new(DigestFallbackProvider), Arc::new(MemoryStore::new()));
        assert!(ctx.is_fallback());
        ctx.identity().await.unwrap();
        assert!(ctx.sign("m").await.unwrap().is_fallback);
        assert!(matches!(
            ctx.issue_token("example.com").await,
            Err(ContextError::Token(uauth_sso::TokenError::UntrustedProvider))
        ));
    }

    #[tokio::test]
    async fn regenerate_replaces_identity() {
        let mut ctx = memory_context();
        let before = ctx.identity().await.unwrap();
        let after = ctx.regenerate().unwrap();
        assert_ne!(before.user_id(), after.user_id());
        assert_eq!(ctx.identity().await.unwrap().user_id(), after.user_id());
        assert_eq!(ctx.store().load_identity().unwrap().unwrap().user_id(), after.user_id());
    }

    #[tokio::test]
    async fn unreadable_record_is_not_overwritten() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let stored = context_over(Arc::new(DigestFallbackProvider), backend.clone())
            .identity()
            .await
            .unwrap();
        let raw = backend.get(DEFAULT_STORAGE_KEY).unwrap();

        let mut ctx = memory_context_over(backend.clone());
        assert!(matches!(ctx.identity().await, Err(ContextError::IdentityUnreadable(_))));
        assert!(matches!(ctx.existing_identity().await, Err(ContextError::IdentityUnreadable(_))));
        assert!(matches!(ctx.sign("m").await, Err(ContextError::IdentityUnreadable(_))));
        assert_eq!(backend.get(DEFAULT_STORAGE_KEY).unwrap(), raw);

        let replaced = ctx.regenerate().unwrap();
        assert_ne!(replaced.user_id(), stored.user_id());
        assert_eq!(ctx.identity().await.unwrap().user_id(), replaced.user_id());
    }

    #[tokio::test]
    async fn import_replaces_identity_and_export_round_trips() {
        let source = memory_context();
        let original = source.identity().await.unwrap();
        let json = source.export_identity().await.unwrap().to_json_pretty().unwrap();

        let mut target = memory_context();
        target.identity().await.unwrap();
        let imported = target.import_identity(&json).unwrap();
        assert_eq!(imported.user_id(), original.user_id());
        let reloaded = target.identity().await.unwrap();
        assert_eq!(reloaded.key_pair.private_key, original.key_pair.private_key);
    }

    #[tokio::test]
    async fn rejected_import_keeps_current_identity() {
        let mut ctx = memory_context();
        let current = ctx.identity().await.unwrap();
        assert!(matches!(ctx.import_identity("{}"), Err(ContextError::Import(_))));
        assert_eq!(ctx.identity().await.unwrap().user_id(), current.user_id());
    }

    #[tokio::test]
    async fn clear_forgets_identity() {
        let mut ctx = memory_context();
        ctx.identity().await.unwrap();
        ctx.clear().unwrap();
        assert!(!ctx.is_initialized());
        assert!(matches!(ctx.existing_identity().await, Err(ContextError::NoIdentity)));
    }

    #[tokio::test]
    async fn generated_identity_carries_profile() {
        let profile = Profile {
            email: Some("ada@example.com".into()),
            name: None,
        };
        let ctx = memory_context().with_profile(profile.clone());
        assert_eq!(ctx.identity().await.unwrap().profile, profile);
    }

    #[test]
    fn from_config_uses_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuthConfig {
            storage_dir: dir.path().to_path_buf(),
            ..AuthConfig::default()
        };
        let ctx = IdentityContext::from_config(&config).unwrap();
        assert_eq!(ctx.provider_kind(), ProviderKind::Ed25519);
        assert_eq!(ctx.selection(), &ProviderSelection::PrimaryAvailable);
    }

    struct NoEntropy;

    impl CapabilityProbe for NoEntropy {
        fn entropy_available(&self) -> Result<(), String> {
            Err("no entropy".into())
        }
        fn primary_self_test(&self) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn unavailable_crypto_fails_construction() {
        let err = IdentityContext::from_config_with_probe(&AuthConfig::default(), &NoEntropy)
            .unwrap_err();
        assert!(matches!(err, ContextError::Crypto(CryptoError::Unavailable(_))));
    }
}
