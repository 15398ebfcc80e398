//! # uauth CLI entry point
//!
//! Parses command-line arguments, loads configuration from the environment,
//! and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use uauth_cli::identity::{
    run_export, run_import, run_keygen, run_whoami, ExportArgs, ImportArgs, KeygenArgs, WhoamiArgs,
};
use uauth_cli::probe::{run_probe, ProbeArgs};
use uauth_cli::signing::{run_sign, run_verify, SignArgs, VerifyArgs};
use uauth_cli::token::{run_token, TokenArgs};
use uauth_identity::AuthConfig;

/// Universal auth: zero-custody device identity and cross-domain SSO tokens.
///
/// Keys are generated and kept on this device. Tokens are self-verifying
/// and need no server to check.
#[derive(Parser, Debug)]
#[command(name = "uauth", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding the identity record (overrides UAUTH_HOME).
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report which crypto provider this host supports.
    Probe(ProbeArgs),

    /// Generate the device identity.
    Keygen(KeygenArgs),

    /// Show the stored identity.
    Whoami(WhoamiArgs),

    /// Sign a message with the stored identity.
    Sign(SignArgs),

    /// Verify a message signature.
    Verify(VerifyArgs),

    /// Issue or verify SSO tokens.
    Token(TokenArgs),

    /// Write a backup of the identity, including its private key.
    Export(ExportArgs),

    /// Replace the identity with one from a backup.
    Import(ImportArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match AuthConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };
    if let Some(home) = cli.home {
        config.storage_dir = home;
    }
    tracing::debug!(?config, "resolved configuration");

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Probe(args) => run_probe(&args, &config),
            Commands::Keygen(args) => run_keygen(&args, &config).await,
            Commands::Whoami(args) => run_whoami(&args, &config).await,
            Commands::Sign(args) => run_sign(&args, &config).await,
            Commands::Verify(args) => run_verify(&args, &config),
            Commands::Token(args) => run_token(&args, &config).await,
            Commands::Export(args) => run_export(&args, &config).await,
            Commands::Import(args) => run_import(&args, &config).await,
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
