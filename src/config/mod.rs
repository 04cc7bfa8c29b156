pub mod manifest;
pub mod user;
pub mod variable;

use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::{bukkit, spigot};
use crate::net;

pub use manifest::{ConfigureDirective, Manifest, ManifestEntry, TemplateDirective};
pub use user::{app_dir, load_user_config, UserConfig};

/// Settings for one resolver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Retry missing versions against the latest release.
    pub latest: bool,
    pub timeout: Duration,
    pub user_agent: String,
    /// Directory of `*.rhai` configurator scripts, scanned before the
    /// built-in configurators.
    pub registry: Option<PathBuf>,
    pub spigot_api: String,
    pub bukget_api: String,
    /// Skip the configuration phase entirely.
    pub no_configure: bool,
    /// Holds the scratch script cache.
    pub app_dir: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            latest: false,
            timeout: net::DEFAULT_TIMEOUT,
            user_agent: net::DEFAULT_USER_AGENT.to_string(),
            registry: None,
            spigot_api: spigot::DEFAULT_API.to_string(),
            bukget_api: bukkit::DEFAULT_API.to_string(),
            no_configure: false,
            app_dir: PathBuf::from(".mcresolver"),
        }
    }
}

impl ResolverConfig {
    /// Defaults overlaid with whatever the user config file sets.
    pub fn from_user(user: Option<UserConfig>, app_dir: PathBuf) -> Self {
        let mut config = Self {
            app_dir,
            ..Self::default()
        };
        let Some(user) = user else {
            return config;
        };
        if let Some(latest) = user.latest {
            config.latest = latest;
        }
        if let Some(secs) = user.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(agent) = user.user_agent {
            config.user_agent = agent;
        }
        if user.registry.is_some() {
            config.registry = user.registry;
        }
        if let Some(api) = user.spigot_api {
            config.spigot_api = api;
        }
        if let Some(api) = user.bukget_api {
            config.bukget_api = api;
        }
        config
    }
}
