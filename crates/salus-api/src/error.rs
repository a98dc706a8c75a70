use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `salus-api` crate.
///
/// Covers every failure mode of a portal session: login scraping,
/// session expiry, transport, and payload interpretation.
/// `salus-core` decides what each of these means for published state.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login completed at the transport level but the portal did not
    /// hand out a usable session (wrong credentials, changed markup, ...).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The portal answered HTTP 401 and a single re-login did not help.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Device state ────────────────────────────────────────────────
    /// The thermostat reports frost protection instead of a reading.
    #[error("Device is in frost protection mode")]
    FrostProtection,

    /// A write was answered with an explicit `errorMsg`.
    #[error("Portal rejected the command: {message}")]
    RemoteRejected { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-success HTTP status other than 401.
    #[error("Portal returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The payload could not be interpreted, with the raw body for debugging.
    #[error("Malformed portal response: {message}")]
    MalformedResponse { message: String, body: String },
}

impl Error {
    /// Map a `reqwest` failure, folding timeouts into [`Error::Timeout`].
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout }
        } else {
            Self::Transport(err)
        }
    }
}
