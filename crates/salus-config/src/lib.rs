//! Configuration for the Salus CLI.
//!
//! TOML file, credential resolution (env + keyring + plaintext), and
//! translation to `salus_core::ThermostatConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use salus_core::ThermostatConfig;

/// Keyring service name; the account is the portal username.
const KEYRING_SERVICE: &str = "salus";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SALUS_CONFIG";

/// Password source checked before the keyring.
pub const PASSWORD_ENV: &str = "SALUS_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured: {missing}")]
    NoCredentials { missing: String },

    #[error("keyring error: {reason}")]
    Keyring { reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Portal account (e-mail address).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Portal password (plaintext -- prefer the keyring).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Polling cadence in seconds (floored at 30 by the controller).
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default = "default_portal_url")]
    pub portal_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Default output format for the CLI.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            poll_interval: default_poll_interval(),
            portal_url: default_portal_url(),
            timeout: default_timeout(),
            output: default_output(),
        }
    }
}

fn default_poll_interval() -> u64 {
    salus_core::config::DEFAULT_POLL_INTERVAL_SECS
}
fn default_portal_url() -> String {
    "https://salus-it500.com".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_output() -> String {
    "table".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `SALUS_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }

    ProjectDirs::from("com", "salus", "salus").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("salus");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Layer defaults, the TOML file at `path`, then `SALUS_*` env vars.
///
/// `SALUS_PASSWORD` is not merged here; [`resolve_password`] reads it.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SALUS_").ignore(&["config", "password"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password: `SALUS_PASSWORD`, then the keyring entry for
/// the configured username, then the plaintext field.
pub fn resolve_password(cfg: &Config) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(SecretString::from(pw));
        }
    }

    // 2. Keyring
    if let Some(ref username) = cfg.username {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, username) {
            if let Ok(pw) = entry.get_password() {
                return Ok(SecretString::from(pw));
            }
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = cfg.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        missing: "password".into(),
    })
}

/// Store the password for `username` in the system keyring.
pub fn store_password(username: &str, password: &SecretString) -> Result<(), ConfigError> {
    let entry =
        keyring::Entry::new(KEYRING_SERVICE, username).map_err(|e| ConfigError::Keyring {
            reason: format!("failed to access keyring: {e}"),
        })?;
    entry
        .set_password(password.expose_secret())
        .map_err(|e| ConfigError::Keyring {
            reason: format!("failed to store password in keyring: {e}"),
        })
}

/// Build a `ThermostatConfig` from the file config.
pub fn to_thermostat_config(cfg: &Config) -> Result<ThermostatConfig, ConfigError> {
    let username = cfg
        .username
        .clone()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            missing: "username".into(),
        })?;

    let portal_url: url::Url = cfg
        .portal_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "portal_url".into(),
            reason: format!("invalid URL: {}", cfg.portal_url),
        })?;

    if cfg.timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least one second".into(),
        });
    }

    let password = resolve_password(cfg)?;

    Ok(ThermostatConfig {
        username,
        password,
        portal_url,
        poll_interval_secs: cfg.poll_interval,
        timeout: Duration::from_secs(cfg.timeout),
        ..ThermostatConfig::default()
    })
}
