//! Bootstrap configuration loading and TOML persistence helpers
//!
//! Bootstrap settings (port, bind address, logging, settings location) come
//! from a small TOML file. Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Built-in default (fallback)
//!
//! Runtime settings are persisted separately by the service using
//! [`read_toml_or_default`] and [`write_toml_atomic`].

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application directory name under the OS config directory
pub const APP_DIR_NAME: &str = "autogenre";

/// Default HTTP port for agp-tagger
pub const DEFAULT_PORT: u16 = 5790;

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The service must restart
/// to pick up changes to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Location of the runtime settings file (optional)
    ///
    /// If not specified, `<config dir>/autogenre/settings.toml` is used.
    #[serde(default)]
    pub settings_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            settings_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Get the AutoGenre configuration directory for the platform
///
/// - Linux: `~/.config/autogenre`
/// - macOS: `~/Library/Application Support/autogenre`
/// - Windows: `%APPDATA%\autogenre`
pub fn app_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Resolve the bootstrap config file path
///
/// An explicit path (CLI or environment) wins; otherwise the platform
/// default `<config dir>/autogenre/config.toml` is used.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(app_config_dir()?.join("config.toml")),
    }
}

/// Load bootstrap configuration
///
/// A missing file yields [`TomlConfig::default`]; a file that exists but
/// cannot be parsed is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let config: TomlConfig = read_toml_or_default(path)?;
    tracing::debug!(
        path = %path.display(),
        port = config.port,
        log_level = %config.logging.level,
        "Bootstrap configuration loaded"
    );
    Ok(config)
}

/// Read a TOML document, falling back to `T::default()` when the file is absent
pub fn read_toml_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| {
        Error::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Write a TOML document atomically
///
/// The parent directory is created if missing. Content goes to a sibling
/// temporary file first and is then renamed over the target, so readers
/// never observe a half-written document.
pub fn write_toml_atomic<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(value)
        .map_err(|e| Error::Serialization(format!("Failed to encode TOML: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}
