//! Application context for the RecordVault CLI.
//!
//! Bundles the parsed arguments with lazily loaded configuration and the
//! shared store, so handlers only pay for what they touch.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use recordvault_core::auth::{CredentialVerifier, JwtSessions};
use recordvault_core::crypto::{KeyManager, MissingKeyPolicy};
use recordvault_core::storage::SqliteStore;
use recordvault_core::Vault;

use crate::cli::Cli;
use crate::config::{read_config, resolve_config_path, LoggingSection, RecordVaultConfig};
use crate::errors::CliError;

use super::secrets::{key_passphrase, session_secret};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config_path: PathBuf,
    config: OnceCell<RecordVaultConfig>,
    store: OnceCell<Arc<SqliteStore>>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> anyhow::Result<Self> {
        Ok(Self {
            cli,
            config_path: resolve_config_path(cli.config.as_deref())?,
            config: OnceCell::new(),
            store: OnceCell::new(),
        })
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn json(&self) -> bool {
        self.cli.json
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// True when prompts are allowed.
    pub fn interactive(&self) -> bool {
        !self.cli.no_input && std::io::stdin().is_terminal()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Logging settings from the config file, or defaults when it is absent
    /// or unreadable (the command itself reports that).
    pub fn logging_settings(&self) -> LoggingSection {
        self.config()
            .map(|config| config.logging.clone())
            .unwrap_or_default()
    }

    pub fn config(&self) -> anyhow::Result<&RecordVaultConfig> {
        self.config.get_or_try_init(|| {
            if !self.config_path.exists() {
                return Err(CliError::not_found(
                    format!("No configuration found at {}", self.config_path.display()),
                    "Run:\n  recordvault init",
                )
                .into());
            }
            read_config(&self.config_path)
        })
    }

    pub fn store(&self) -> anyhow::Result<Arc<SqliteStore>> {
        self.store
            .get_or_try_init(|| {
                let path = self.config()?.database_path();
                tracing::debug!(config = %self.config_path.display(), "Configuration loaded");
                let store = SqliteStore::open(&path).map_err(|e| {
                    anyhow::Error::from(e)
                        .context(format!("Failed to open database {}", path.display()))
                })?;
                Ok(Arc::new(store))
            })
            .cloned()
    }

    /// Key manager for the configured directory, reading the passphrase.
    pub fn key_manager(&self, policy: MissingKeyPolicy) -> anyhow::Result<KeyManager> {
        let dir = self.config()?.keys_dir();
        let passphrase = key_passphrase(self.interactive(), false)?;
        Ok(KeyManager::new(dir, passphrase, policy))
    }

    pub fn sessions(&self) -> anyhow::Result<JwtSessions> {
        let ttl = self.config()?.session.ttl_seconds;
        Ok(JwtSessions::new(&session_secret()?, ttl)?)
    }

    pub fn verifier(&self) -> anyhow::Result<CredentialVerifier> {
        Ok(CredentialVerifier::new(self.store()?))
    }

    /// The full facade for token-gated record commands.
    pub fn vault(&self) -> anyhow::Result<Vault> {
        let store = self.store()?;
        let sessions = self.sessions()?;
        let keys = self.key_manager(MissingKeyPolicy::Fail)?;
        Ok(Vault::new(
            Arc::new(keys),
            store.clone(),
            store,
            Arc::new(sessions),
        ))
    }
}
