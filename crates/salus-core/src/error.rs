// ── Core error types ──
//
// User-facing errors from salus-core. Consumers never see HTTP status
// codes or scraping details directly; the `From<salus_api::Error>` impl
// translates session-layer errors into domain variants.

use std::time::Duration;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session expired -- re-login did not restore access")]
    SessionExpired,

    #[error("Cannot reach portal: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Portal request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    // ── Device errors ────────────────────────────────────────────────
    #[error("Device is in frost protection mode")]
    FrostProtection,

    #[error("Operation rejected by portal: {message}")]
    Rejected { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── State surface errors ─────────────────────────────────────────
    #[error("State error: {message}")]
    State { message: String },
}

impl CoreError {
    /// Returns `true` for failures a later poll may recover from.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::Timeout { .. }
                | Self::Api {
                    status: Some(500..=599),
                    ..
                }
        )
    }
}

// ── Conversion from session-layer errors ─────────────────────────────

impl From<salus_api::Error> for CoreError {
    fn from(err: salus_api::Error) -> Self {
        match err {
            salus_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            salus_api::Error::SessionExpired => CoreError::SessionExpired,
            salus_api::Error::FrostProtection => CoreError::FrostProtection,
            salus_api::Error::RemoteRejected { message } => CoreError::Rejected { message },
            salus_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            salus_api::Error::Timeout { timeout } => CoreError::Timeout { timeout },
            salus_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid portal URL: {e}"),
            },
            salus_api::Error::Http { status, message } => CoreError::Api {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            salus_api::Error::MalformedResponse { message, body: _ } => CoreError::Api {
                message: format!("Malformed response: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_session_errors() {
        assert!(matches!(
            CoreError::from(salus_api::Error::SessionExpired),
            CoreError::SessionExpired
        ));
        assert!(matches!(
            CoreError::from(salus_api::Error::FrostProtection),
            CoreError::FrostProtection
        ));
        let err = CoreError::from(salus_api::Error::Timeout {
            timeout: Duration::from_millis(1500),
        });
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Portal request timed out after 1.5s");
    }

    #[test]
    fn server_errors_are_transient() {
        let err = CoreError::from(salus_api::Error::Http {
            status: 503,
            message: "busy".into(),
        });
        assert!(err.is_transient());

        let err = CoreError::from(salus_api::Error::Http {
            status: 404,
            message: "gone".into(),
        });
        assert!(!err.is_transient());
    }

    #[test]
    fn rejection_message_is_kept_verbatim() {
        let err = CoreError::from(salus_api::Error::RemoteRejected {
            message: "Device offline".into(),
        });
        assert_eq!(err.to_string(), "Operation rejected by portal: Device offline");
    }
}
