//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use salus_config::ConfigError;
use salus_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const DEVICE: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Salus portal")]
    #[diagnostic(
        code(salus::connection_failed),
        help(
            "Check your network connection and the portal URL.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(salus::auth_failed),
        help(
            "Verify your username and password.\n\
             Run: salus config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Portal session expired and could not be renewed")]
    #[diagnostic(
        code(salus::session_expired),
        help("The portal rejected a fresh login. Try again later or re-check your credentials.")
    )]
    SessionExpired,

    #[error("No {missing} configured")]
    #[diagnostic(
        code(salus::no_credentials),
        help(
            "Configure credentials with: salus config init\n\
             Or set SALUS_USERNAME and SALUS_PASSWORD."
        )
    )]
    NoCredentials { missing: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Thermostat is in frost protection mode")]
    #[diagnostic(
        code(salus::frost_protection),
        help("No reading is available until the device leaves frost protection.")
    )]
    FrostProtection,

    #[error("Portal rejected the command: {message}")]
    #[diagnostic(code(salus::rejected))]
    Rejected { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Portal error: {message}")]
    #[diagnostic(code(salus::api_error))]
    ApiError { message: String },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(salus::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(salus::config))]
    Config(Box<figment::Error>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {timeout:?}")]
    #[diagnostic(
        code(salus::timeout),
        help("Increase the timeout with --timeout or try again later.")
    )]
    Timeout { timeout: Duration },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::SessionExpired | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::FrostProtection | Self::Rejected { .. } => exit_code::DEVICE,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::SessionExpired => CliError::SessionExpired,
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },
            CoreError::Timeout { timeout } => CliError::Timeout { timeout },
            CoreError::FrostProtection => CliError::FrostProtection,
            CoreError::Rejected { message } => CliError::Rejected { message },
            CoreError::Api { message, .. }
            | CoreError::State { message } => CliError::ApiError { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { missing } => CliError::NoCredentials { missing },
            ConfigError::Keyring { reason } => CliError::Validation {
                field: "keyring".into(),
                reason,
            },
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let cases = [
            (CoreError::SessionExpired, exit_code::AUTH),
            (CoreError::FrostProtection, exit_code::DEVICE),
            (
                CoreError::ConnectionFailed {
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::Timeout {
                    timeout: Duration::from_secs(10),
                },
                exit_code::TIMEOUT,
            ),
            (
                CoreError::Config {
                    message: "username is not configured".into(),
                },
                exit_code::USAGE,
            ),
            (
                CoreError::State {
                    message: "setTemp is not declared".into(),
                },
                exit_code::GENERAL,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn missing_credentials_is_an_auth_failure() {
        let err = CliError::from(ConfigError::NoCredentials {
            missing: "password".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert!(err.to_string().contains("password"));
    }
}
