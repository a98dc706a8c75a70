//! CLI-side configuration: the config file with global flag overrides.

use salus_config::Config;
use salus_core::ThermostatConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file and apply `--username`, `--portal-url`, `--timeout`.
pub fn load_with_overrides(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = salus_config::load_config()?;

    if let Some(ref username) = global.username {
        cfg.username = Some(username.clone());
    }
    if let Some(ref url) = global.portal_url {
        cfg.portal_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    Ok(cfg)
}

/// Build a `ThermostatConfig` from the config file and CLI overrides.
pub fn build_thermostat_config(cfg: &Config) -> Result<ThermostatConfig, CliError> {
    Ok(salus_config::to_thermostat_config(cfg)?)
}
