// ── Runtime thermostat configuration ──
//
// Describes *how* to reach one thermostat: account credentials, portal
// location, and polling cadence. Never touches disk; the CLI (via
// salus-config) constructs a `ThermostatConfig` and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use salus_api::{Credentials, DEFAULT_PORTAL_URL, DEFAULT_TIMEOUT, TransportConfig};

use crate::error::CoreError;

/// Lower bound on the polling cadence, in seconds.
pub const MIN_POLL_INTERVAL_SECS: u64 = 30;

/// Polling cadence used when none is configured.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Wait between an applied write and the confirming status read.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Configuration for polling a single thermostat.
#[derive(Debug, Clone)]
pub struct ThermostatConfig {
    /// Portal account (e-mail address).
    pub username: String,
    /// Portal password.
    pub password: SecretString,
    /// Portal base URL (defaults to the public IT500 portal).
    pub portal_url: Url,
    /// Requested polling cadence (seconds). Floored at 30 when armed.
    pub poll_interval_secs: u64,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Delay before re-reading after an applied write.
    pub settle_delay: Duration,
}

impl ThermostatConfig {
    /// Config for the public portal with default cadence and timeout.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            ..Self::default()
        }
    }

    /// The cadence the controller actually arms.
    pub fn effective_poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    /// Fail fast when credentials are missing.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.username.trim().is_empty() || self.password.expose_secret().is_empty() {
            return Err(CoreError::Config {
                message: "username and password are required".into(),
            });
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::new(self.portal_url.clone()).with_timeout(self.timeout)
    }
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: SecretString::from(String::new()),
            portal_url: default_portal_url(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

fn default_portal_url() -> Url {
    Url::parse(DEFAULT_PORTAL_URL).expect("default portal URL should parse")
}
