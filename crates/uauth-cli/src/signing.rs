//! # Sign and Verify Subcommands
//!
//! Messages are signed over their UTF-8 bytes with the stored identity.
//! Signatures from the digest fallback are printed with a warning; they are
//! checksums, not proof of key possession.

use anyhow::Result;
use clap::Args;
use uauth_core::CryptoError;
use uauth_identity::{AuthConfig, ContextError};

use crate::open_context;

/// Arguments for `uauth sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Message to sign.
    #[arg(value_name = "MESSAGE")]
    pub message: String,
}

/// Arguments for `uauth verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Signer's public key (hex).
    #[arg(long)]
    pub public_key: String,
    /// Signature to check (hex).
    #[arg(long)]
    pub signature: String,
    /// Message that was signed.
    #[arg(value_name = "MESSAGE")]
    pub message: String,
}

/// Execute `uauth sign`. Prints the hex signature on stdout.
pub async fn run_sign(args: &SignArgs, config: &AuthConfig) -> Result<u8> {
    let ctx = open_context(config)?;
    match ctx.sign(&args.message).await {
        Ok(signed) => {
            if signed.is_fallback {
                eprintln!("WARN: digest fallback signature; this is not an Ed25519 signature");
            }
            println!("{}", signed.signature);
            Ok(0)
        }
        Err(ContextError::NoIdentity) => {
            println!("FAIL: no identity; run `uauth keygen` first");
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

/// Execute `uauth verify`.
pub fn run_verify(args: &VerifyArgs, config: &AuthConfig) -> Result<u8> {
    let ctx = open_context(config)?;
    match ctx.verify(&args.message, &args.signature, &args.public_key) {
        Ok(true) => {
            println!("OK: signature is valid");
            Ok(0)
        }
        Ok(false) => {
            println!("FAIL: signature does not match");
            Ok(1)
        }
        Err(ContextError::Crypto(CryptoError::MalformedInput(reason))) => {
            println!("FAIL: malformed input: {reason}");
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}
