//! # Crypto Provider Abstraction
//!
//! Abstracts key generation, signing, and verification behind a trait with
//! two backends:
//!
//! - [`Ed25519Provider`](crate::Ed25519Provider): real Ed25519 signatures.
//! - [`DigestFallbackProvider`](crate::DigestFallbackProvider): a degraded,
//!   self-consistent checksum scheme used only when Ed25519 cannot be used.
//!
//! ## Selection
//!
//! A provider is chosen once, by [`detect_provider`], which returns a tagged
//! [`ProviderSelection`] instead of throwing from inside signing calls.
//! [`select_provider`] turns that result into a boxed provider. Nothing
//! switches providers afterwards.

use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use uauth_core::CryptoError;

use crate::ed25519::{self, Ed25519Provider};
use crate::fallback::DigestFallbackProvider;
use crate::keys::PrivateKeyHex;

/// Which backend a provider is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Ed25519 via `ed25519-dalek`.
    Ed25519,
    /// SHA-256 checksum fallback. Not a signature scheme.
    DigestFallback,
}

impl ProviderKind {
    /// True for the degraded fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::DigestFallback)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "ed25519"),
            Self::DigestFallback => write!(f, "digest-fallback"),
        }
    }
}

/// Hex-encoded key material as produced by a provider, before the
/// identifier is derived.
#[derive(Debug, Clone)]
pub struct ExportedKeys {
    /// Public key in the provider's interchange encoding.
    pub public_key: String,
    /// Private key in the provider's interchange encoding.
    pub private_key: PrivateKeyHex,
}

/// Trait for signature backends.
///
/// Implementations MUST:
/// - Return `Ok(false)` from `verify` when a well-formed signature does not
///   match. `Err` is reserved for structurally invalid input.
/// - Never log private key material.
///
/// The trait is object-safe for use with `Box<dyn CryptoProvider>`.
pub trait CryptoProvider: Send + Sync + std::fmt::Debug {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// True when this provider cannot produce trust-bearing signatures.
    fn is_fallback(&self) -> bool {
        self.kind().is_fallback()
    }

    /// Generate a fresh key pair and export both halves as hex.
    fn generate(&self) -> Result<ExportedKeys, CryptoError>;

    /// Sign `message` with the given private key. Returns hex.
    fn sign(&self, private_key: &PrivateKeyHex, message: &[u8]) -> Result<String, CryptoError>;

    /// Check a hex signature over `message` against a hex public key.
    fn verify(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &str,
    ) -> Result<bool, CryptoError>;

    /// Recompute the public key for a private key, in the same encoding
    /// `generate` exports. Used to validate imported identities.
    fn public_key_for(&self, private_key: &PrivateKeyHex) -> Result<String, CryptoError>;
}

// ─── Capability detection ───────────────────────────────────────────────

/// Caller preference for provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderPreference {
    /// Ed25519 when it passes self-test, otherwise the fallback.
    #[default]
    Auto,
    /// Ed25519 or nothing.
    Primary,
    /// Force the fallback, for environments that must exercise it.
    Fallback,
}

impl FromStr for ProviderPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "primary" | "ed25519" => Ok(Self::Primary),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!(
                "unknown provider preference {other:?} (expected auto, primary, or fallback)"
            )),
        }
    }
}

/// Outcome of capability detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSelection {
    /// Ed25519 is usable.
    PrimaryAvailable,
    /// Ed25519 is not usable (or was declined); the fallback will be used.
    FallbackRequired {
        /// Why the primary was not selected.
        reason: String,
    },
    /// No provider can operate.
    Unavailable {
        /// Why nothing could be selected.
        reason: String,
    },
}

/// What detection asks of the host. Abstracted so tests can simulate
/// broken hosts.
pub trait CapabilityProbe {
    /// Whether the OS entropy source can fill a buffer.
    fn entropy_available(&self) -> Result<(), String>;

    /// Whether the Ed25519 primitive reproduces its known-answer vector.
    fn primary_self_test(&self) -> Result<(), String>;
}

/// Probes the real host: `OsRng` and `ed25519-dalek`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl CapabilityProbe for HostProbe {
    fn entropy_available(&self) -> Result<(), String> {
        let mut buf = [0u8; 32];
        OsRng.try_fill_bytes(&mut buf).map_err(|e| format!("OS entropy source failed: {e}"))
    }

    fn primary_self_test(&self) -> Result<(), String> {
        ed25519::known_answer_test()
    }
}

/// Decide which provider to use.
pub fn detect_provider(
    preference: ProviderPreference,
    probe: &dyn CapabilityProbe,
) -> ProviderSelection {
    if let Err(reason) = probe.entropy_available() {
        tracing::error!(%reason, "no entropy source; cryptography unavailable");
        return ProviderSelection::Unavailable { reason };
    }

    let selection = match preference {
        ProviderPreference::Fallback => ProviderSelection::FallbackRequired {
            reason: "fallback provider requested".to_string(),
        },
        ProviderPreference::Primary => match probe.primary_self_test() {
            Ok(()) => ProviderSelection::PrimaryAvailable,
            Err(e) => ProviderSelection::Unavailable {
                reason: format!("Ed25519 required but self-test failed: {e}"),
            },
        },
        ProviderPreference::Auto => match probe.primary_self_test() {
            Ok(()) => ProviderSelection::PrimaryAvailable,
            Err(e) => ProviderSelection::FallbackRequired {
                reason: format!("Ed25519 self-test failed: {e}"),
            },
        },
    };

    match &selection {
        ProviderSelection::PrimaryAvailable => {
            tracing::info!(?preference, "selected Ed25519 provider")
        }
        ProviderSelection::FallbackRequired { reason } => tracing::warn!(
            ?preference,
            %reason,
            "selected digest fallback provider; tokens cannot be issued"
        ),
        ProviderSelection::Unavailable { reason } => {
            tracing::error!(?preference, %reason, "no crypto provider")
        }
    }
    selection
}

/// Instantiate the provider a selection names.
pub fn select_provider(
    selection: &ProviderSelection,
) -> Result<Box<dyn CryptoProvider>, CryptoError> {
    match selection {
        ProviderSelection::PrimaryAvailable => Ok(Box::new(Ed25519Provider)),
        ProviderSelection::FallbackRequired { .. } => Ok(Box::new(DigestFallbackProvider)),
        ProviderSelection::Unavailable { reason } => Err(CryptoError::Unavailable(reason.clone())),
    }
}

/// Fill a 32-byte secret from the OS entropy source.
pub(crate) fn random_secret() -> Result<zeroize::Zeroizing<[u8; 32]>, CryptoError> {
    let mut secret = zeroize::Zeroizing::new([0u8; 32]);
    OsRng
        .try_fill_bytes(&mut secret[..])
        .map_err(|e| CryptoError::KeyGeneration(format!("OS entropy source failed: {e}")))?;
    Ok(secret)
}
