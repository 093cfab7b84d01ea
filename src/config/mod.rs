//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the database path.
pub const DB_ENV_VAR: &str = "GRID_LEDGER_DB";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory scanned for race spreadsheets
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/league.db")
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("./spreadsheets")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            input_dir: default_input_dir(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&contents)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, defaults otherwise. The
    /// `GRID_LEDGER_DB` environment variable wins over both.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env();
            config.validate()?;
            Ok(config)
        }
    }

    fn apply_env(&mut self) {
        if let Ok(db) = std::env::var(DB_ENV_VAR) {
            if !db.trim().is_empty() {
                self.database_path = PathBuf::from(db);
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "database_path must not be empty".to_string(),
            ));
        }

        if self.input_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "input_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.database_path, PathBuf::from("./data/league.db"));
        assert_eq!(config.input_dir, PathBuf::from("./spreadsheets"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_database_path() {
        let mut config = AppConfig::default();
        config.database_path = PathBuf::new();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
database_path = "/var/lib/league/league.db"
input_dir = "/srv/spreadsheets"
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/league/league.db")
        );
        assert_eq!(config.input_dir, PathBuf::from("/srv/spreadsheets"));
        // Unspecified fields fall back to defaults.
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_load_missing_file_uses_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig::load(&temp_dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("./spreadsheets"));
    }

    #[test]
    fn test_config_parse_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "database_path = [not toml").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.database_path, parsed.database_path);
    }
}
