//! Configuration loading for LCPM modules
//!
//! Bootstrap configuration comes from a TOML file plus command-line
//! overrides. Only settings that cannot change while running live here:
//! database path, HTTP port, log level. Everything else is data and
//! belongs in the database.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--port, --database)
//! 2. TOML configuration file
//! 3. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The server must restart
/// to pick up changes to the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file (relative or absolute)
    ///
    /// If not specified, falls back to the OS data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    ///
    /// Default: 5800
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_port() -> u16 {
    5800
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from a TOML file at this path
    File(PathBuf),
    /// No config file found, built-in defaults used
    Defaults,
}

/// Resolved configuration after merging TOML, overrides, and defaults
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub database_path: PathBuf,

    /// HTTP server port
    pub port: u16,

    /// Log level for the tracing filter
    pub log_level: String,

    /// Where the TOML values came from
    pub source: ConfigSource,
}

impl Config {
    /// Load configuration, merging sources by priority
    ///
    /// - `config_path`: explicit TOML path. If given and missing or
    ///   unparseable, this is an error. If `None`, the platform default
    ///   path is tried and silently skipped when absent.
    /// - `overrides`: command-line values that win over the TOML file.
    pub fn load(config_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let (toml_config, source) = match config_path {
            Some(path) => {
                let parsed = read_toml(path)?;
                (parsed, ConfigSource::File(path.to_path_buf()))
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    let parsed = read_toml(&path)?;
                    (parsed, ConfigSource::File(path))
                }
                _ => (default_toml_config(), ConfigSource::Defaults),
            },
        };

        match &source {
            ConfigSource::File(path) => info!("Loaded configuration from {:?}", path),
            ConfigSource::Defaults => warn!("No config file found, using built-in defaults"),
        }

        let database_path = overrides
            .database_path
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);
        let port = overrides.port.unwrap_or(toml_config.port);

        Ok(Config {
            database_path,
            port,
            log_level: toml_config.logging.level,
            source,
        })
    }
}

fn read_toml(path: &Path) -> Result<TomlConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("Failed to parse {:?}: {}", path, e)))
}

fn default_toml_config() -> TomlConfig {
    TomlConfig {
        database_path: None,
        port: default_port(),
        logging: LoggingConfig::default(),
    }
}

/// Default configuration file path for the platform
///
/// Linux: ~/.config/lcpm/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lcpm").join("config.toml"))
}

/// Default database path for the platform
///
/// Linux: ~/.local/share/lcpm/lcpm.db
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lcpm").join("lcpm.db"))
        .unwrap_or_else(|| PathBuf::from("./lcpm.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_port() {
        assert_eq!(default_port(), 5800);
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).expect("create config");
        writeln!(file, "database_path = \"/tmp/lcpm-test.db\"").unwrap();
        writeln!(file, "port = 6123").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"debug\"").unwrap();

        let config =
            Config::load(Some(&path), ConfigOverrides::default()).expect("load should succeed");
        assert_eq!(config.database_path, PathBuf::from("/tmp/lcpm-test.db"));
        assert_eq!(config.port, 6123);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.source, ConfigSource::File(path));
    }

    #[test]
    fn test_load_explicit_file_missing_is_error() {
        let result = Config::load(
            Some(Path::new("/nonexistent/lcpm/config.toml")),
            ConfigOverrides::default(),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"not a number\"").expect("write config");

        let result = Config::load(Some(&path), ConfigOverrides::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = 6123").expect("write config");

        let overrides = ConfigOverrides {
            database_path: Some(PathBuf::from("/tmp/override.db")),
            port: Some(7000),
        };
        let config = Config::load(Some(&path), overrides).expect("load should succeed");
        assert_eq!(config.port, 7000);
        assert_eq!(config.database_path, PathBuf::from("/tmp/override.db"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "database_path = \"/tmp/partial.db\"").expect("write config");

        let config =
            Config::load(Some(&path), ConfigOverrides::default()).expect("load should succeed");
        assert_eq!(config.port, 5800);
        assert_eq!(config.log_level, "info");
    }
}
