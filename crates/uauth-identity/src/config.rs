//! # Configuration
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `UAUTH_HOME` | directory holding the identity record | `./.uauth` |
//! | `UAUTH_STORAGE_KEY` | record name inside that directory | `universal_auth_identity` |
//! | `UAUTH_PROVIDER` | `auto`, `primary`, or `fallback` | `auto` |
//! | `UAUTH_PASSPHRASE` | seals the private key at rest | unset |
//! | `UAUTH_CLOCK_LEEWAY_MS` | extra validity accepted when verifying tokens | `0` |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use uauth_crypto::ProviderPreference;
use uauth_store::DEFAULT_STORAGE_KEY;
use zeroize::Zeroizing;

pub const ENV_HOME: &str = "UAUTH_HOME";
pub const ENV_STORAGE_KEY: &str = "UAUTH_STORAGE_KEY";
pub const ENV_PROVIDER: &str = "UAUTH_PROVIDER";
pub const ENV_PASSPHRASE: &str = "UAUTH_PASSPHRASE";
pub const ENV_CLOCK_LEEWAY_MS: &str = "UAUTH_CLOCK_LEEWAY_MS";

/// Upper bound on configurable verifier leeway.
pub const MAX_CLOCK_LEEWAY: Duration = Duration::from_secs(10 * 60);

/// Passphrase buffer, zeroized on drop.
pub type Passphrase = Zeroizing<String>;

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

/// Runtime configuration.
#[derive(Clone)]
pub struct AuthConfig {
    pub storage_dir: PathBuf,
    pub storage_key: String,
    pub provider: ProviderPreference,
    pub passphrase: Option<Passphrase>,
    pub clock_leeway: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".uauth"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            provider: ProviderPreference::Auto,
            passphrase: None,
            clock_leeway: Duration::ZERO,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("storage_dir", &self.storage_dir)
            .field("storage_key", &self.storage_key)
            .field("provider", &self.provider)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .field("clock_leeway", &self.clock_leeway)
            .finish()
    }
}

impl AuthConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`. Unset and empty variables take
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(home) = get(ENV_HOME) {
            config.storage_dir = PathBuf::from(home);
        }

        if let Some(key) = get(ENV_STORAGE_KEY) {
            let key = key.trim();
            let allowed = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.');
            if !key.bytes().all(allowed) || key.starts_with('.') {
                return Err(ConfigError {
                    var: ENV_STORAGE_KEY,
                    reason: format!("{key:?} may only contain letters, digits, '-', '_', '.'"),
                });
            }
            config.storage_key = key.to_string();
        }

        if let Some(provider) = get(ENV_PROVIDER) {
            config.provider = provider.parse().map_err(|reason| ConfigError {
                var: ENV_PROVIDER,
                reason,
            })?;
        }

        config.passphrase = lookup(ENV_PASSPHRASE).filter(|p| !p.is_empty()).map(Zeroizing::new);

        if let Some(leeway) = get(ENV_CLOCK_LEEWAY_MS) {
            let ms: u64 = leeway.trim().parse().map_err(|e| ConfigError {
                var: ENV_CLOCK_LEEWAY_MS,
                reason: format!("{leeway:?} is not a non-negative integer: {e}"),
            })?;
            let leeway = Duration::from_millis(ms);
            if leeway > MAX_CLOCK_LEEWAY {
                return Err(ConfigError {
                    var: ENV_CLOCK_LEEWAY_MS,
                    reason: format!(
                        "{ms} exceeds the maximum of {} ms",
                        MAX_CLOCK_LEEWAY.as_millis()
                    ),
                });
            }
            config.clock_leeway = leeway;
        }

        Ok(config)
    }
}
