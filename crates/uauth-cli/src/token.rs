//! # Token Subcommands
//!
//! `token issue <DOMAIN>` prints a base64 SSO token for the stored identity.
//! `token verify <TOKEN>` prints the verification result as JSON and exits
//! `0` only when the token is valid.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use uauth_identity::{AuthConfig, ContextError};
use uauth_sso::TokenError;

use crate::open_context;

/// Arguments for `uauth token`.
#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Issue a token for a target domain.
    Issue {
        /// Domain the token is intended for.
        #[arg(value_name = "DOMAIN")]
        domain: String,
    },

    /// Verify a token.
    Verify {
        /// Base64 token string.
        #[arg(value_name = "TOKEN")]
        token: String,
        /// Require the token to name this domain.
        #[arg(long)]
        domain: Option<String>,
    },
}

/// Execute `uauth token`.
pub async fn run_token(args: &TokenArgs, config: &AuthConfig) -> Result<u8> {
    match &args.command {
        TokenCommand::Issue { domain } => cmd_issue(domain, config).await,
        TokenCommand::Verify { token, domain } => cmd_verify(token, domain.as_deref(), config),
    }
}

async fn cmd_issue(domain: &str, config: &AuthConfig) -> Result<u8> {
    let ctx = open_context(config)?;
    match ctx.issue_token(domain).await {
        Ok(token) => {
            println!("{token}");
            Ok(0)
        }
        Err(ContextError::NoIdentity) => {
            println!("FAIL: no identity; run `uauth keygen` first");
            Ok(1)
        }
        Err(ContextError::Token(TokenError::UntrustedProvider)) => {
            println!("FAIL: the digest fallback provider cannot issue SSO tokens");
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_verify(token: &str, domain: Option<&str>, config: &AuthConfig) -> Result<u8> {
    let ctx = open_context(config)?;
    let result = match domain {
        Some(domain) => ctx.verify_token_for(token, domain),
        None => ctx.verify_token(token),
    };
    let json = serde_json::to_string_pretty(&result)
        .context("failed to serialize verification result")?;
    println!("{json}");
    Ok(if result.is_valid() { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use uauth_crypto::ProviderPreference;

    fn config_in(dir: &Path) -> AuthConfig {
        AuthConfig {
            storage_dir: dir.to_path_buf(),
            ..AuthConfig::default()
        }
    }

    async fn issued_token(config: &AuthConfig, domain: &str) -> String {
        let ctx = open_context(config).unwrap();
        ctx.identity().await.unwrap();
        ctx.issue_token(domain).await.unwrap()
    }

    #[tokio::test]
    async fn issue_requires_identity() {
        let dir = tempfile::tempdir().unwrap();
        let args = TokenArgs {
            command: TokenCommand::Issue {
                domain: "example.com".into(),
            },
        };
        assert_eq!(run_token(&args, &config_in(dir.path())).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn verify_valid_and_wrong_domain() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let token = issued_token(&config, "example.com").await;

        let verify = |domain: Option<&str>| TokenArgs {
            command: TokenCommand::Verify {
                token: token.clone(),
                domain: domain.map(str::to_string),
            },
        };
        assert_eq!(run_token(&verify(None), &config).await.unwrap(), 0);
        assert_eq!(run_token(&verify(Some("example.com")), &config).await.unwrap(), 0);
        assert_eq!(run_token(&verify(Some("other.com")), &config).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn verify_garbage_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let args = TokenArgs {
            command: TokenCommand::Verify {
                token: "not a token".into(),
                domain: None,
            },
        };
        assert_eq!(run_token(&args, &config_in(dir.path())).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fallback_cannot_issue() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuthConfig {
            provider: ProviderPreference::Fallback,
            ..config_in(dir.path())
        };
        open_context(&config).unwrap().identity().await.unwrap();
        let args = TokenArgs {
            command: TokenCommand::Issue {
                domain: "example.com".into(),
            },
        };
        assert_eq!(run_token(&args, &config).await.unwrap(), 1);
    }
}
