use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 3600;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// On-disk configuration. Secrets never live here.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordVaultConfig {
    pub storage: StorageSection,
    pub keys: KeysSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageSection {
    pub database_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeysSection {
    pub dir: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_ttl() -> u64 {
    DEFAULT_SESSION_TTL_SECONDS
}

fn default_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl RecordVaultConfig {
    pub fn new(database_path: &Path, keys_dir: &Path, ttl_seconds: u64) -> Self {
        Self {
            storage: StorageSection {
                database_path: database_path.to_string_lossy().to_string(),
            },
            keys: KeysSection {
                dir: keys_dir.to_string_lossy().to_string(),
            },
            session: SessionSection { ttl_seconds },
            logging: LoggingSection::default(),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.database_path)
    }

    pub fn keys_dir(&self) -> PathBuf {
        PathBuf::from(&self.keys.dir)
    }
}

/// `$RECORDVAULT_CONFIG` (or `--config`) wins over the XDG default.
pub fn resolve_config_path(explicit: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
        return Ok(PathBuf::from(value));
    }
    default_config_path()
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_database_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("recordvault.db"))
}

pub fn default_keys_dir() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("keys"))
}

pub fn read_config(path: &Path) -> anyhow::Result<RecordVaultConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &RecordVaultConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("recordvault"));
        }
    }
    Ok(home_dir()?.join(".config").join("recordvault"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("recordvault"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("recordvault"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = RecordVaultConfig::new(
            &dir.path().join("vault.db"),
            &dir.path().join("keys"),
            900,
        );
        write_config(&path, &config).unwrap();

        let loaded = read_config(&path).unwrap();
        assert_eq!(loaded.database_path(), dir.path().join("vault.db"));
        assert_eq!(loaded.keys_dir(), dir.path().join("keys"));
        assert_eq!(loaded.session.ttl_seconds, 900);
        assert_eq!(loaded.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_optional_sections_default() {
        let config: RecordVaultConfig = toml::from_str(
            "[storage]\ndatabase_path = \"/tmp/v.db\"\n\n[keys]\ndir = \"/tmp/keys\"\n",
        )
        .unwrap();
        assert_eq!(config.session.ttl_seconds, DEFAULT_SESSION_TTL_SECONDS);
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_json_log_format_parses() {
        let config: RecordVaultConfig = toml::from_str(
            "[storage]\ndatabase_path = \"a\"\n[keys]\ndir = \"b\"\n[logging]\nlevel = \"debug\"\nformat = \"json\"\n",
        )
        .unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = resolve_config_path(Some("/etc/recordvault.toml")).unwrap();
        assert_eq!(path, PathBuf::from("/etc/recordvault.toml"));
    }
}
