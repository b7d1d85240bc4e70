use recordvault_core::crypto::{
    inspect_key_dir, stored_fingerprint, KeyDirStatus, KeyManager, MissingKeyPolicy,
};

use crate::app::secrets::{key_passphrase, new_key_passphrase};
use crate::app::AppContext;
use crate::cli::KeysCommand;
use crate::output::print_json;

use super::init::keygen_spinner;

pub fn handle_keys(ctx: &AppContext, command: &KeysCommand) -> anyhow::Result<()> {
    match command {
        KeysCommand::Init { key_bits } => handle_keys_init(ctx, *key_bits),
        KeysCommand::Status { check } => handle_keys_status(ctx, *check),
        KeysCommand::Rewrap => handle_keys_rewrap(ctx),
    }
}

fn handle_keys_init(ctx: &AppContext, key_bits: u16) -> anyhow::Result<()> {
    let dir = ctx.config()?.keys_dir();
    let passphrase = key_passphrase(ctx.interactive(), true)?;
    let keys = KeyManager::new(dir, passphrase, MissingKeyPolicy::Fail)
        .with_modulus_bits(usize::from(key_bits));

    let spinner = keygen_spinner(ctx, key_bits);
    let pair = keys.generate();
    spinner.finish_and_clear();
    let pair = pair?;

    if ctx.json() {
        return print_json(&serde_json::json!({
            "keys_dir": keys.dir(),
            "fingerprint": pair.fingerprint(),
            "bits": pair.modulus_bits(),
        }));
    }
    if !ctx.quiet() {
        println!("Generated key pair in {}", keys.dir().display());
    }
    println!("{}", pair.fingerprint());
    Ok(())
}

fn status_label(status: KeyDirStatus) -> &'static str {
    match status {
        KeyDirStatus::Complete => "complete",
        KeyDirStatus::Partial => "partial",
        KeyDirStatus::Missing => "missing",
    }
}

fn handle_keys_status(ctx: &AppContext, check: bool) -> anyhow::Result<()> {
    let dir = ctx.config()?.keys_dir();
    let status = inspect_key_dir(&dir);
    let fingerprint = match status {
        KeyDirStatus::Complete => Some(stored_fingerprint(&dir)?),
        _ => None,
    };

    let unlocked = if check {
        let keys = ctx.key_manager(MissingKeyPolicy::Fail)?;
        keys.private_key()?;
        Some(true)
    } else {
        None
    };

    if ctx.json() {
        return print_json(&serde_json::json!({
            "keys_dir": dir,
            "status": status_label(status),
            "fingerprint": fingerprint,
            "unlocked": unlocked,
        }));
    }
    println!("status=\"{}\"", status_label(status));
    if !ctx.quiet() {
        println!("dir=\"{}\"", dir.display());
        if let Some(fp) = &fingerprint {
            println!("fingerprint=\"{}\"", fp);
        }
        if unlocked.is_some() {
            println!("unlocked=\"yes\"");
        }
    }
    Ok(())
}

fn handle_keys_rewrap(ctx: &AppContext) -> anyhow::Result<()> {
    let mut keys = ctx.key_manager(MissingKeyPolicy::Fail)?;
    let new_passphrase = new_key_passphrase(ctx.interactive())?;
    keys.rewrap_private_key(new_passphrase)?;
    let fingerprint = keys.fingerprint()?;

    if ctx.json() {
        return print_json(&serde_json::json!({
            "keys_dir": keys.dir(),
            "fingerprint": fingerprint,
            "rewrapped": true,
        }));
    }
    if !ctx.quiet() {
        println!("Private key rewrapped; key pair unchanged ({})", fingerprint);
        println!("Update KEY_ENCRYPTION_PASSPHRASE wherever it is configured.");
    }
    Ok(())
}
