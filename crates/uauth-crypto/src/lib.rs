//! # uauth-crypto
//!
//! Key generation, message signing, and signature verification for
//! universal auth, behind a [`CryptoProvider`] chosen once at startup.
//!
//! ## Providers
//!
//! - [`Ed25519Provider`]: Ed25519 via `ed25519-dalek`, keys exported as
//!   SPKI / PKCS#8 DER hex.
//! - [`DigestFallbackProvider`]: SHA-256 checksum used only when Ed25519
//!   fails its self-test. Everything it produces is flagged `is_fallback`.
//!
//! ## Selection
//!
//! [`detect_provider`] probes the host and returns a tagged
//! [`ProviderSelection`]; [`select_provider`] instantiates it.
//!
//! ```
//! use uauth_crypto::{
//!     detect_provider, generate_key_pair, select_provider, HostProbe, ProviderPreference,
//! };
//!
//! let selection = detect_provider(ProviderPreference::Auto, &HostProbe);
//! let provider = select_provider(&selection).unwrap();
//! let pair = generate_key_pair(provider.as_ref()).unwrap();
//! assert_eq!(pair.user_id.as_str().len(), 16);
//! ```

pub mod ed25519;
pub mod fallback;
pub mod keygen;
pub mod keys;
pub mod provider;
pub mod signer;

pub use ed25519::Ed25519Provider;
pub use fallback::DigestFallbackProvider;
pub use keygen::generate_key_pair;
pub use keys::{KeyPair, PrivateKeyHex};
pub use provider::{
    detect_provider, select_provider, CapabilityProbe, CryptoProvider, ExportedKeys, HostProbe,
    ProviderKind, ProviderPreference, ProviderSelection,
};
pub use signer::{MessageSignature, MessageSigner, SignatureVerifier};
pub use uauth_core::CryptoError;
