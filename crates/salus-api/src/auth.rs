// Portal authentication
//
// Form-based login followed by a scrape of the device page. The login
// endpoint sets the session cookies; the device page hands out the token
// and device id that every later call carries.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::scrape::{SessionFields, extract_session_fields};
use crate::session::{DEVICES_PATH, LOGIN_PATH, PortalSession, SessionState, preview};

/// Account credentials for the portal. Immutable once built.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

impl PortalSession {
    /// Log in and scrape a fresh session.
    ///
    /// Always performs both round trips and unconditionally replaces any
    /// previous session. On failure the session is left unusable.
    pub async fn login(&self) -> Result<(), Error> {
        self.authenticate(SessionState::Authenticating)
            .await
            .map(|_| ())
    }

    pub(crate) async fn authenticate(&self, phase: SessionState) -> Result<SessionFields, Error> {
        self.set_state(phase);
        self.store_session(None);

        match self.scrape_session().await {
            Ok(fields) => {
                self.store_session(Some(fields.clone()));
                self.set_state(SessionState::Authenticated);
                info!(device_id = %fields.device_id, "logged in to portal");
                Ok(fields)
            }
            Err(e) => {
                let next = if matches!(e, Error::Authentication { .. }) {
                    SessionState::Failed
                } else {
                    SessionState::Unauthenticated
                };
                self.set_state(next);
                warn!(error = %e, "portal login failed");
                Err(e)
            }
        }
    }

    async fn scrape_session(&self) -> Result<SessionFields, Error> {
        let login_url = self.url(LOGIN_PATH)?;
        debug!("logging in at {}", login_url);

        let form = [
            ("IDemail", self.credentials.username()),
            ("password", self.credentials.password().expose_secret()),
            ("login", "Login"),
        ];
        let resp = self.send(self.http().post(login_url).form(&form)).await?;

        // The form answers with a redirect on success.
        let status = resp.status();
        if !(status.is_success() || status.is_redirection()) {
            let body = self.read_body(resp).await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        let devices_url = self.url(DEVICES_PATH)?;
        debug!("login accepted, fetching device page at {}", devices_url);

        let resp = self.send(self.http().get(devices_url)).await?;
        let status = resp.status();
        let markup = self.read_body(resp).await?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("device page unavailable (HTTP {status})"),
            });
        }

        extract_session_fields(&markup).ok_or_else(|| Error::Authentication {
            message: "token or device id missing -- check credentials".into(),
        })
    }
}
