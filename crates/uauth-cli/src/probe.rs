//! # Probe Subcommand
//!
//! Runs capability detection and prints the outcome.

use anyhow::Result;
use clap::Args;
use uauth_crypto::{detect_provider, HostProbe, ProviderSelection};
use uauth_identity::AuthConfig;

/// Arguments for `uauth probe`.
#[derive(Args, Debug)]
pub struct ProbeArgs {}

/// Execute `uauth probe`.
pub fn run_probe(_args: &ProbeArgs, config: &AuthConfig) -> Result<u8> {
    match detect_provider(config.provider, &HostProbe) {
        ProviderSelection::PrimaryAvailable => {
            println!("OK: Ed25519 provider available");
            Ok(0)
        }
        ProviderSelection::FallbackRequired { reason } => {
            println!("WARN: digest fallback in use ({reason})");
            println!("  Signatures are flagged as fallback; SSO tokens cannot be issued.");
            Ok(0)
        }
        ProviderSelection::Unavailable { reason } => {
            println!("FAIL: no crypto provider ({reason})");
            Ok(1)
        }
    }
}
