// ── Published state surface ──
//
// The key/value surface a host observes and writes through. Values are
// published by the controller with `ack = true`; consumer requests arrive
// with `ack = false` and are turned into portal writes.

mod definitions;
mod store;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

pub use definitions::{StateDefinition, ValueKind, definition_of, definitions};
pub use store::{StateSnapshot, StateStore};

/// Keys of the published state surface.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum StateKey {
    #[strum(serialize = "info.connection")]
    #[serde(rename = "info.connection")]
    Connection,
    #[strum(serialize = "currentTemp")]
    #[serde(rename = "currentTemp")]
    CurrentTemp,
    #[strum(serialize = "setTemp")]
    #[serde(rename = "setTemp")]
    SetTemp,
    #[strum(serialize = "autoMode")]
    #[serde(rename = "autoMode")]
    AutoMode,
    #[strum(serialize = "heatStatus")]
    #[serde(rename = "heatStatus")]
    HeatStatus,
    #[strum(serialize = "info.deviceId")]
    #[serde(rename = "info.deviceId")]
    DeviceId,
}

/// A published value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl StateValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for StateValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<String> for StateValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for StateValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// The current value of one key, with its acknowledgment flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedState {
    pub value: StateValue,
    /// `true` when the value reflects the device, `false` for a pending request.
    pub ack: bool,
    pub updated_at: DateTime<Utc>,
}

/// Change notification broadcast by the [`StateStore`].
///
/// `value` is `None` when the key was deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub key: StateKey,
    pub value: Option<StateValue>,
    pub ack: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn keys_round_trip_through_their_ids() {
        for key in StateKey::iter() {
            assert_eq!(StateKey::from_str(key.as_ref()).unwrap(), key);
        }
        assert_eq!(StateKey::Connection.to_string(), "info.connection");
        assert_eq!(StateKey::DeviceId.to_string(), "info.deviceId");
    }

    #[test]
    fn unknown_key_does_not_parse() {
        assert!(StateKey::from_str("humidity").is_err());
    }

    #[test]
    fn values_serialize_untagged() {
        assert_eq!(serde_json::to_string(&StateValue::from(21.5)).unwrap(), "21.5");
        assert_eq!(serde_json::to_string(&StateValue::from(true)).unwrap(), "true");
        assert_eq!(
            serde_json::to_string(&StateValue::from("D1")).unwrap(),
            "\"D1\""
        );
        let parsed: StateValue = serde_json::from_str("false").unwrap();
        assert_eq!(parsed, StateValue::Bool(false));
    }
}
