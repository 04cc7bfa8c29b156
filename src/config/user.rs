use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ResolverError, Result};

/// User-level configuration loaded from `~/.config/mcresolver/config.toml`.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserConfig {
    /// Fall back to the latest version when a requested one is missing.
    pub latest: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    /// Directory of `*.rhai` configurator scripts.
    pub registry: Option<PathBuf>,
    pub spigot_api: Option<String>,
    pub bukget_api: Option<String>,
}

/// Get the path to the user config file.
fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mcresolver").join("config.toml"))
}

/// Load user configuration from the XDG config directory.
///
/// Returns `Ok(None)` if the config file does not exist.
/// Returns `Err` if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<Option<UserConfig>> {
    match config_path() {
        Some(path) => load_user_config_from(&path),
        None => Ok(None),
    }
}

pub fn load_user_config_from(path: &Path) -> Result<Option<UserConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ResolverError::Io {
        context: format!("reading user config {}", path.display()),
        source: e,
    })?;

    let config: UserConfig =
        toml::from_str(&content).map_err(|e| ResolverError::ConfigParse { source: e })?;

    Ok(Some(config))
}

/// Application data directory.
///
/// Checks `MCRESOLVER_HOME` first, then falls back to `~/.mcresolver`.
pub fn app_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MCRESOLVER_HOME") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|d| d.join(".mcresolver"))
        .ok_or_else(|| ResolverError::Io {
            context: "unable to determine the application directory: set MCRESOLVER_HOME or ensure a home directory exists".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no home directory available"),
        })
}
