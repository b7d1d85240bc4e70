use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use recordvault_core::crypto::{inspect_key_dir, KeyDirStatus, KeyManager, MissingKeyPolicy};
use recordvault_core::storage::SqliteStore;

use crate::app::secrets::key_passphrase;
use crate::app::AppContext;
use crate::cli::InitArgs;
use crate::config::{default_database_path, default_keys_dir, write_config, RecordVaultConfig};
use crate::errors::CliError;

/// Spinner for key generation, hidden when output is not for a human.
pub fn keygen_spinner(ctx: &AppContext, bits: u16) -> ProgressBar {
    if ctx.json() || ctx.quiet() || !ctx.interactive() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Generating {}-bit RSA key pair", bits));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = ctx.config_path().to_path_buf();
    if config_path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}. Use --force to overwrite it.",
            config_path.display()
        ))
        .into());
    }

    let database_path = match &args.database {
        Some(path) => PathBuf::from(path),
        None => default_database_path()?,
    };
    let keys_dir = match &args.keys_dir {
        Some(path) => PathBuf::from(path),
        None => default_keys_dir()?,
    };

    let existing_keys = inspect_key_dir(&keys_dir);
    if existing_keys == KeyDirStatus::Partial {
        return Err(CliError::invalid_input(format!(
            "Keys directory {} holds only one key file; restore the other before running init",
            keys_dir.display()
        ))
        .into());
    }

    let passphrase = key_passphrase(ctx.interactive(), existing_keys == KeyDirStatus::Missing)?;
    let keys = KeyManager::new(&keys_dir, passphrase, MissingKeyPolicy::Generate)
        .with_modulus_bits(usize::from(args.key_bits));

    let spinner = if existing_keys == KeyDirStatus::Missing {
        keygen_spinner(ctx, args.key_bits)
    } else {
        ProgressBar::hidden()
    };
    let pair = keys.load_or_create_key_pair();
    spinner.finish_and_clear();
    let pair = pair?;

    let store = SqliteStore::open(&database_path)?;
    store.check_integrity()?;

    let config = RecordVaultConfig::new(&database_path, &keys_dir, args.session_ttl_seconds);
    write_config(&config_path, &config)?;
    tracing::info!(config = %config_path.display(), "RecordVault initialized");

    if ctx.json() {
        return crate::output::print_json(&serde_json::json!({
            "config": config_path,
            "database": database_path,
            "keys_dir": keys_dir,
            "fingerprint": pair.fingerprint(),
            "generated": existing_keys == KeyDirStatus::Missing,
        }));
    }
    if !ctx.quiet() {
        println!("Initialized RecordVault");
        println!("  config:      {}", config_path.display());
        println!("  database:    {}", database_path.display());
        println!("  keys:        {}", keys_dir.display());
        println!("  fingerprint: {}", pair.fingerprint());
        if existing_keys == KeyDirStatus::Missing {
            println!();
            println!("Back up the keys directory. Without it, stored records cannot be decrypted.");
        }
        println!();
        println!("Next, provision an admin:\n  recordvault admin add <EMAIL>");
    }
    Ok(())
}
