// salus-api: Async Rust client for the Salus IT500 thermostat web portal

pub mod auth;
pub mod cookies;
pub mod error;
pub mod models;
pub mod scrape;
pub mod session;
mod thermostat;
pub mod transport;

pub use auth::Credentials;
pub use cookies::CookieJar;
pub use error::Error;
pub use models::{DeviceStatus, FROST_PROTECTION_CODE, auto_mode_wire_value};
pub use scrape::{SessionFields, extract_session_fields};
pub use session::{PortalSession, SessionState};
pub use transport::{DEFAULT_PORTAL_URL, DEFAULT_TIMEOUT, TransportConfig};
