//! Key pair generation over whichever provider was selected.

use uauth_core::{derive_user_id, CryptoError};

use crate::keys::KeyPair;
use crate::provider::CryptoProvider;

/// Generate a fresh key pair and derive its user identifier.
///
/// Either every field is populated or an error is returned. Nothing is
/// persisted.
pub fn generate_key_pair(provider: &dyn CryptoProvider) -> Result<KeyPair, CryptoError> {
    let exported = provider.generate()?;
    let user_id = derive_user_id(&exported.public_key)?;
    tracing::debug!(%user_id, provider = %provider.kind(), "generated key pair");
    Ok(KeyPair {
        public_key: exported.public_key,
        private_key: exported.private_key,
        user_id,
        is_fallback: provider.is_fallback(),
    })
}
