pub mod check;
pub mod generate;
pub mod resolve;

use miette::Result;

use mcresolver::config::{app_dir, load_user_config, ResolverConfig};

/// Defaults layered with the user config file.
pub fn base_config() -> Result<ResolverConfig> {
    let user = load_user_config()?;
    Ok(ResolverConfig::from_user(user, app_dir()?))
}
