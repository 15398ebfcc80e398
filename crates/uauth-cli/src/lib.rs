//! # uauth-cli: Universal Auth Command-Line Interface
//!
//! ## Subcommands
//!
//! - `uauth probe`: report which crypto provider this host supports
//! - `uauth keygen`: create the device identity
//! - `uauth whoami`: show the stored identity
//! - `uauth sign` / `uauth verify`: sign and check messages
//! - `uauth token issue` / `uauth token verify`: SSO tokens
//! - `uauth export` / `uauth import`: identity backup and migration
//!
//! Handlers return an exit code: `0` for success or a valid result, `1` for
//! a negative answer. Errors propagate as `anyhow::Error` and exit `1`.

pub mod identity;
pub mod probe;
pub mod signing;
pub mod token;

use anyhow::{Context, Result};
use uauth_identity::{AuthConfig, IdentityContext};

/// Build the identity context for a command.
pub fn open_context(config: &AuthConfig) -> Result<IdentityContext> {
    IdentityContext::from_config(config).context("failed to initialize identity context")
}
