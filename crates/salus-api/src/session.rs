// Portal session transport
//
// Owns the scraped session (token + device id), the captured cookie jar,
// and the request plumbing shared by login and the thermostat operations.
// Operations live as inherent methods in `auth.rs` and `thermostat.rs`
// to keep this module focused on session mechanics.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::Credentials;
use crate::cookies::CookieJar;
use crate::error::Error;
use crate::scrape::SessionFields;
use crate::transport::TransportConfig;

pub(crate) const LOGIN_PATH: &str = "/public/login.php";
pub(crate) const DEVICES_PATH: &str = "/public/devices.php";
pub(crate) const STATUS_PATH: &str = "/public/ajax_device_values.php";
pub(crate) const COMMAND_PATH: &str = "/includes/set.php";

/// Re-logins attempted per call before an expiry becomes terminal.
const MAX_REAUTHENTICATIONS: u8 = 1;

/// Lifecycle of a portal session, observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Reauthenticating,
    Failed,
}

/// A call that needs a usable session.
pub(crate) enum PortalCall {
    /// `GET` the status endpoint.
    Status,
    /// `POST` the command endpoint with these extra form fields.
    Command(Vec<(&'static str, String)>),
}

/// Authenticated session against the Salus IT500 portal.
///
/// One instance per credential set. The session is established lazily on
/// the first call (or eagerly via [`login`](Self::login)) and re-established
/// at most once per call when the portal answers HTTP 401.
pub struct PortalSession {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    pub(crate) credentials: Credentials,
    session: RwLock<Option<SessionFields>>,
    cookies: RwLock<CookieJar>,
    state: watch::Sender<SessionState>,
}

impl PortalSession {
    /// Create a session from a `TransportConfig`. Does not touch the network.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut session = Self::with_client(http, transport.base_url.clone(), credentials);
        session.timeout = transport.timeout;
        Ok(session)
    }

    /// Create a session around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            http,
            base_url,
            timeout: crate::transport::DEFAULT_TIMEOUT,
            credentials,
            session: RwLock::new(None),
            cookies: RwLock::new(CookieJar::new()),
            state,
        }
    }

    /// The portal base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The account this session logs in as.
    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Device id of the current session, if usable.
    pub fn device_id(&self) -> Option<String> {
        self.session_fields().map(|f| f.device_id)
    }

    /// Whether both token and device id are held.
    pub fn is_authenticated(&self) -> bool {
        self.session.read().expect("session lock poisoned").is_some()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribe to lifecycle state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The `Cookie` header value replayed on every request.
    pub fn cookie_header(&self) -> Option<String> {
        self.cookies.read().expect("cookie lock poisoned").header_value()
    }

    // ── Session state ────────────────────────────────────────────────

    pub(crate) fn session_fields(&self) -> Option<SessionFields> {
        self.session.read().expect("session lock poisoned").clone()
    }

    pub(crate) fn store_session(&self, fields: Option<SessionFields>) {
        *self.session.write().expect("session lock poisoned") = fields;
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        trace!(?state, "session state");
        self.state.send_replace(state);
    }

    // ── Cookie hooks ─────────────────────────────────────────────────

    fn apply_cookies(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.cookie_header() {
            Some(value) => builder.header(COOKIE, value),
            None => builder,
        }
    }

    /// Post-response hook: replace the jar if the response set cookies.
    fn capture_cookies(&self, headers: &HeaderMap) {
        let mut jar = self.cookies.write().expect("cookie lock poisoned");
        if jar.capture(headers) {
            trace!(count = jar.len(), "captured session cookies");
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    /// Send a request with the cookie jar attached, then run the cookie hook.
    pub(crate) async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, Error> {
        let resp = self
            .apply_cookies(builder)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout))?;

        self.capture_cookies(resp.headers());
        Ok(resp)
    }

    pub(crate) async fn read_body(&self, resp: reqwest::Response) -> Result<String, Error> {
        resp.text()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout))
    }

    /// Run `call` with a usable session.
    ///
    /// Logs in first if the session is unusable. A 401 triggers one
    /// re-login and one retry; a second consecutive 401 is terminal.
    /// Timeouts and other failures are returned as-is without re-login.
    pub(crate) async fn call(&self, call: &PortalCall) -> Result<Value, Error> {
        let mut fields = match self.session_fields() {
            Some(fields) => fields,
            None => {
                debug!("no usable session, logging in");
                self.authenticate(SessionState::Authenticating).await?
            }
        };

        let mut reauthentications = 0;
        loop {
            match self.call_once(call, &fields).await {
                Err(Error::SessionExpired) if reauthentications < MAX_REAUTHENTICATIONS => {
                    warn!("portal session expired, re-authenticating");
                    reauthentications += 1;
                    fields = self.authenticate(SessionState::Reauthenticating).await?;
                }
                Err(Error::SessionExpired) => {
                    warn!("portal session expired again after re-login");
                    self.set_state(SessionState::Failed);
                    return Err(Error::SessionExpired);
                }
                result => return result,
            }
        }
    }

    async fn call_once(&self, call: &PortalCall, fields: &SessionFields) -> Result<Value, Error> {
        let builder = match call {
            PortalCall::Status => {
                let url = self.url(STATUS_PATH)?;
                debug!("GET {}", url);
                self.http.get(url).query(&[
                    ("devId", fields.device_id.as_str()),
                    ("token", fields.token.as_str()),
                ])
            }
            PortalCall::Command(params) => {
                let url = self.url(COMMAND_PATH)?;
                debug!("POST {}", url);
                let mut form: Vec<(&str, &str)> = vec![
                    ("token", fields.token.as_str()),
                    ("devId", fields.device_id.as_str()),
                ];
                form.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
                self.http.post(url).form(&form)
            }
        };

        let resp = self.send(builder).await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        let body = self.read_body(resp).await?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        match call {
            PortalCall::Status => serde_json::from_str(&body).map_err(|e| {
                Error::MalformedResponse {
                    message: format!("{e} (body preview: {:?})", preview(&body)),
                    body: body.clone(),
                }
            }),
            // Confirmations are not always JSON; hand back the text verbatim.
            PortalCall::Command(_) => {
                Ok(serde_json::from_str(&body).unwrap_or_else(|_| Value::String(body)))
            }
        }
    }
}

pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
