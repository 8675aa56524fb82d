//! Runtime settings persistence and credential resolution for agp-tagger
//!
//! Settings live in a TOML document next to the bootstrap config. Provider
//! credentials resolve with **Environment → Settings** priority.

use agp_common::config::{app_config_dir, read_toml_or_default, write_toml_atomic};
use agp_common::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::models::AppSettings;

/// Settings file name inside the application config directory
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

pub const ENV_SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const ENV_BEATPORT_USERNAME: &str = "BEATPORT_USERNAME";
pub const ENV_BEATPORT_PASSWORD: &str = "BEATPORT_PASSWORD";

/// Resolve the runtime settings file path
///
/// Priority: explicit path (CLI/env) → bootstrap TOML `settings_path` →
/// `<config dir>/autogenre/settings.toml`.
pub fn resolve_settings_path(
    explicit: Option<&Path>,
    from_toml: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = explicit.or(from_toml) {
        return Ok(path.to_path_buf());
    }
    Ok(app_config_dir()?.join(SETTINGS_FILE_NAME))
}

/// Load/save boundary for [`AppSettings`]
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields defaults
    pub fn load_settings(&self) -> Result<AppSettings> {
        let settings: AppSettings = read_toml_or_default(&self.path)?;
        debug!(path = %self.path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Persist settings atomically
    pub fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        write_toml_atomic(settings, &self.path)?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

/// Credentials handed to the providers; `None` means unconfigured
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub beatport_username: Option<String>,
    pub beatport_password: Option<String>,
}

impl ProviderCredentials {
    /// Resolve every credential, environment first
    pub fn resolve(settings: &AppSettings) -> Self {
        Self {
            spotify_client_id: resolve_credential(
                "Spotify client id",
                ENV_SPOTIFY_CLIENT_ID,
                &settings.spotify_client_id,
            ),
            spotify_client_secret: resolve_credential(
                "Spotify client secret",
                ENV_SPOTIFY_CLIENT_SECRET,
                &settings.spotify_client_secret,
            ),
            beatport_username: resolve_credential(
                "Beatport username",
                ENV_BEATPORT_USERNAME,
                &settings.beatport_username,
            ),
            beatport_password: resolve_credential(
                "Beatport password",
                ENV_BEATPORT_PASSWORD,
                &settings.beatport_password,
            ),
        }
    }
}

/// Resolve one credential from 2-tier configuration
///
/// **Priority:** ENV → Settings. Only the source is logged, never the value.
fn resolve_credential(label: &str, env_var: &str, from_settings: &str) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let settings_value = Some(from_settings).filter(|v| is_valid_key(v));

    if env_value.is_some() && settings_value.is_some() {
        warn!(
            "{} found in environment and settings. Using environment (highest priority).",
            label
        );
    }

    if let Some(value) = env_value {
        debug!("{} loaded from environment variable {}", label, env_var);
        return Some(value);
    }

    settings_value.map(|value| {
        debug!("{} loaded from settings", label);
        value.to_string()
    })
}

/// Validate credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
