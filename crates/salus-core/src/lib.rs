// salus-core: Polling controller and published state surface between
// salus-api and consumers (CLI, home-automation hosts).

pub mod config;
pub mod controller;
pub mod error;
mod guard;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{MIN_POLL_INTERVAL_SECS, ThermostatConfig};
pub use controller::{Controller, RefreshOutcome, WriteOutcome};
pub use error::CoreError;
pub use state::{
    PublishedState, StateChange, StateDefinition, StateKey, StateSnapshot, StateStore,
    StateValue, ValueKind,
};

// Session-layer types consumers need without depending on salus-api.
pub use salus_api::{DeviceStatus, SessionState};
