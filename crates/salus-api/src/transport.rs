// Shared transport configuration for building the portal's reqwest::Client.
//
// Timeout, user agent, redirect policy and base URL live here so the
// session code only deals with the request protocol.

use std::time::Duration;

use reqwest::redirect::Policy;
use url::Url;

use crate::error::Error;

/// Public portal root.
pub const DEFAULT_PORTAL_URL: &str = "https://salus-it500.com";

/// Fixed per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("salus/", env!("CARGO_PKG_VERSION"));

/// Transport configuration for the portal HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_PORTAL_URL).expect("default portal URL is valid"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// Redirects are not followed: the login form answers with a redirect
    /// whose `Set-Cookie` header must reach the session's cookie hook.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(Error::Transport)
    }
}
