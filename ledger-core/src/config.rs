//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "database": { "filename": "ledger.duckdb" },
//!   "credentials": { "timeCost": 3, "memoryCost": 65536, "parallelism": 4 },
//!   "logging": { "enabled": true }
//! }
//! ```
//! Every section is optional. `LEDGER_DB_FILE` and `LEDGER_EVENT_LOG`
//! override the file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::CredentialParams;

pub const SETTINGS_FILENAME: &str = "settings.json";
pub const DEFAULT_DB_FILENAME: &str = "ledger.duckdb";

const DB_FILE_ENV: &str = "LEDGER_DB_FILE";
const EVENT_LOG_ENV: &str = "LEDGER_EVENT_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    pub filename: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            filename: DEFAULT_DB_FILENAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub enabled: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Ledger configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub credentials: CredentialParams,
    pub logging: LoggingSettings,
}

impl Config {
    /// Load config from the data directory, then apply env overrides
    ///
    /// A missing settings file yields the defaults; a malformed one is an error.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILENAME);

        let mut config: Config = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("invalid settings in {}", settings_path.display()))?
        } else {
            Config::default()
        };

        if let Ok(filename) = std::env::var(DB_FILE_ENV) {
            if !filename.trim().is_empty() {
                config.database.filename = filename;
            }
        }
        if let Some(enabled) = std::env::var(EVENT_LOG_ENV).ok().as_deref().and_then(parse_flag) {
            config.logging.enabled = enabled;
        }

        Ok(config)
    }

    /// Save config to the data directory
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(data_dir.join(SETTINGS_FILENAME), content)?;
        Ok(())
    }

    /// Full path of the ledger database
    pub fn db_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database.filename)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
        "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.credentials, CredentialParams::default());
        assert!(config.db_path(dir.path()).ends_with(DEFAULT_DB_FILENAME));
    }

    #[test]
    fn test_partial_settings_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILENAME),
            r#"{"credentials": {"timeCost": 1, "memoryCost": 1024}, "logging": {"enabled": false}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.credentials.time_cost, 1);
        assert_eq!(config.credentials.memory_cost, 1024);
        assert_eq!(config.credentials.parallelism, 4);
        assert_eq!(config.database, DatabaseSettings::default());
    }

    #[test]
    fn test_malformed_settings_file_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILENAME), "{not json").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.database.filename = "other.duckdb".to_string();
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.database.filename, "other.duckdb");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("yes"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
