//! # Identity Subcommands
//!
//! `keygen`, `whoami`, `export`, and `import`.
//!
//! Exports contain the private key in plaintext. They are written with
//! owner-only permissions and should be handled like the key itself.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use uauth_identity::{AuthConfig, ContextError, IdentityContext};
use uauth_store::{Identity, Profile};

use crate::open_context;

/// Arguments for `uauth keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Email recorded with the identity.
    #[arg(long)]
    pub email: Option<String>,
    /// Display name recorded with the identity.
    #[arg(long)]
    pub name: Option<String>,
    /// Replace an existing identity.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `uauth whoami`.
#[derive(Args, Debug)]
pub struct WhoamiArgs {}

/// Arguments for `uauth export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write the backup here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Arguments for `uauth import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Backup file produced by `uauth export`.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute `uauth keygen`.
pub async fn run_keygen(args: &KeygenArgs, config: &AuthConfig) -> Result<u8> {
    let profile = Profile {
        email: args.email.clone(),
        name: args.name.clone(),
    };
    let mut ctx = open_context(config)?.with_profile(profile);

    let existing = ctx.existing_identity().await;
    let identity = match existing {
        Ok(existing) if !args.force => {
            println!("OK: identity already exists (use --force to replace it)");
            print_identity(&existing, &ctx);
            return Ok(0);
        }
        Err(ContextError::IdentityUnreadable(reason)) if !args.force => {
            println!("FAIL: stored identity cannot be opened: {reason}");
            println!("  Check UAUTH_PASSPHRASE, or use --force to replace it.");
            return Ok(1);
        }
        Ok(_) | Err(ContextError::IdentityUnreadable(_)) => ctx.regenerate()?,
        Err(ContextError::NoIdentity) => ctx.identity().await?,
        Err(e) => return Err(e).context("failed to read stored identity"),
    };

    println!("OK: generated identity");
    print_identity(&identity, &ctx);
    if !ctx.store().is_sealed() {
        println!("  Private key is stored unencrypted; set UAUTH_PASSPHRASE to seal it.");
    }
    Ok(0)
}

/// Execute `uauth whoami`.
pub async fn run_whoami(_args: &WhoamiArgs, config: &AuthConfig) -> Result<u8> {
    let ctx = open_context(config)?;
    match ctx.existing_identity().await {
        Ok(identity) => {
            print_identity(&identity, &ctx);
            Ok(0)
        }
        Err(ContextError::NoIdentity) => {
            println!("FAIL: no identity; run `uauth keygen` first");
            Ok(1)
        }
        Err(ContextError::IdentityUnreadable(reason)) => {
            println!("FAIL: stored identity cannot be opened: {reason}");
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

/// Execute `uauth export`.
pub async fn run_export(args: &ExportArgs, config: &AuthConfig) -> Result<u8> {
    let ctx = open_context(config)?;
    let export = ctx.export_identity().await.context("nothing to export")?;
    let json = export.to_json_pretty().context("failed to serialize export")?;

    match &args.output {
        Some(path) => {
            write_private_file(path, json.as_bytes())?;
            println!("OK: exported identity {} to {}", export.user_id, path.display());
            println!("  This file contains the private key. Treat it as a secret.");
        }
        None => println!("{json}"),
    }
    Ok(0)
}

/// Execute `uauth import`.
pub async fn run_import(args: &ImportArgs, config: &AuthConfig) -> Result<u8> {
    let json = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read backup: {}", args.file.display()))?;
    let mut ctx = open_context(config)?;
    match ctx.import_identity(&json) {
        Ok(identity) => {
            println!("OK: imported identity");
            print_identity(&identity, &ctx);
            Ok(0)
        }
        Err(ContextError::Import(e)) => {
            println!("FAIL: {e}");
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_identity(identity: &Identity, ctx: &IdentityContext) {
    println!("  User ID:    {}", identity.user_id());
    println!("  Public key: {}", identity.public_key());
    println!("  Provider:   {}", ctx.provider_kind());
    println!("  Created:    {}", identity.created_at);
    if let Some(email) = &identity.profile.email {
        println!("  Email:      {email}");
    }
    if let Some(name) = &identity.profile.name {
        println!("  Name:       {name}");
    }
}

fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uauth_identity::config::Passphrase;

    fn config_in(dir: &Path) -> AuthConfig {
        AuthConfig {
            storage_dir: dir.to_path_buf(),
            ..AuthConfig::default()
        }
    }

    fn keygen(force: bool) -> KeygenArgs {
        KeygenArgs {
            email: Some("ada@example.com".into()),
            name: None,
            force,
        }
    }

    async fn stored_user_id(config: &AuthConfig) -> String {
        open_context(config)
            .unwrap()
            .existing_identity()
            .await
            .unwrap()
            .user_id()
            .to_string()
    }

    #[tokio::test]
    async fn keygen_creates_record() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        assert_eq!(run_keygen(&keygen(false), &config).await.unwrap(), 0);
        assert!(dir.path().join("universal_auth_identity.json").exists());
        assert_eq!(run_whoami(&WhoamiArgs {}, &config).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn keygen_keeps_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        run_keygen(&keygen(false), &config).await.unwrap();
        let first = stored_user_id(&config).await;
        run_keygen(&keygen(false), &config).await.unwrap();
        assert_eq!(stored_user_id(&config).await, first);
        run_keygen(&keygen(true), &config).await.unwrap();
        assert_ne!(stored_user_id(&config).await, first);
    }

    #[tokio::test]
    async fn keygen_without_passphrase_keeps_sealed_identity() {
        let dir = tempfile::tempdir().unwrap();
        let sealed = AuthConfig {
            passphrase: Some(Passphrase::new("pw".to_string())),
            ..config_in(dir.path())
        };
        run_keygen(&keygen(false), &sealed).await.unwrap();
        let before = stored_user_id(&sealed).await;

        assert_eq!(run_keygen(&keygen(false), &config_in(dir.path())).await.unwrap(), 1);
        assert_eq!(run_whoami(&WhoamiArgs {}, &config_in(dir.path())).await.unwrap(), 1);
        assert_eq!(stored_user_id(&sealed).await, before);

        assert_eq!(run_keygen(&keygen(true), &config_in(dir.path())).await.unwrap(), 0);
        assert_ne!(stored_user_id(&config_in(dir.path())).await, before);
    }

    #[tokio::test]
    async fn whoami_without_identity_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run_whoami(&WhoamiArgs {}, &config_in(dir.path())).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn export_then_import_elsewhere() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let backup = source.path().join("backup.json");

        run_keygen(&keygen(false), &config_in(source.path())).await.unwrap();
        let args = ExportArgs {
            output: Some(backup.clone()),
        };
        assert_eq!(run_export(&args, &config_in(source.path())).await.unwrap(), 0);

        let args = ImportArgs { file: backup };
        assert_eq!(run_import(&args, &config_in(target.path())).await.unwrap(), 0);
        assert_eq!(
            stored_user_id(&config_in(target.path())).await,
            stored_user_id(&config_in(source.path())).await
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn export_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let backup = dir.path().join("backup.json");
        run_keygen(&keygen(false), &config_in(dir.path())).await.unwrap();
        run_export(&ExportArgs { output: Some(backup.clone()) }, &config_in(dir.path()))
            .await
            .unwrap();
        let mode = std::fs::metadata(&backup).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn export_without_identity_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run_export(&ExportArgs { output: None }, &config_in(dir.path())).await.is_err());
    }

    #[tokio::test]
    async fn malformed_import_fails_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let backup = dir.path().join("bad.json");
        let malformed = r#"{"version":1,"userId":"zz","publicKey":"zz","privateKey":"zz"}"#;
        std::fs::write(&backup, malformed).unwrap();
        let config = config_in(&dir.path().join("home"));
        assert_eq!(run_import(&ImportArgs { file: backup }, &config).await.unwrap(), 1);
        assert!(!dir.path().join("home").join("universal_auth_identity.json").exists());
    }

    #[tokio::test]
    async fn sealed_identity_round_trips_through_cli() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuthConfig {
            passphrase: Some(Passphrase::new("pw".to_string())),
            ..config_in(dir.path())
        };
        run_keygen(&keygen(false), &config).await.unwrap();
        let raw = std::fs::read_to_string(dir.path().join("universal_auth_identity.json")).unwrap();
        assert!(raw.contains("sealedPrivateKey"));
        assert_eq!(run_whoami(&WhoamiArgs {}, &config).await.unwrap(), 0);
        assert_eq!(run_whoami(&WhoamiArgs {}, &config_in(dir.path())).await.unwrap(), 1);
    }
}
