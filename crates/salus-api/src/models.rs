// Status payload projection
//
// The status endpoint returns a flat JSON object whose values arrive as
// strings or numbers depending on firmware. `DeviceStatus` is the typed
// projection of that object for a single-zone IT500.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;

/// `frost` value reported while frost protection preempts the reading.
pub const FROST_PROTECTION_CODE: i64 = 32;

pub(crate) const FIELD_CURRENT_TEMP: &str = "CH1currentRoomTemp";
pub(crate) const FIELD_SET_POINT: &str = "CH1currentSetPoint";
pub(crate) const FIELD_AUTO_MODE: &str = "CH1autoMode";
pub(crate) const FIELD_HEAT_STATUS: &str = "CH1heatOnOffStatus";
pub(crate) const FIELD_FROST: &str = "frost";
pub(crate) const FIELD_ERROR_MSG: &str = "errorMsg";

/// Thermostat status derived from one status read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    /// Measured room temperature (°C).
    pub current_temp: f64,
    /// Active set point (°C).
    pub set_temp: f64,
    /// `true` when the thermostat follows its schedule (wire `0`).
    pub auto_mode: bool,
    /// `true` while the boiler is firing (wire `1`).
    pub heat_active: bool,
    /// The payload as received.
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

impl DeviceStatus {
    /// Project a status payload, short-circuiting on frost protection.
    pub fn from_payload(payload: Value) -> Result<Self, Error> {
        let raw = match payload {
            Value::Object(raw) => raw,
            other => return Err(malformed("status payload is not an object", &other)),
        };

        if is_frost_protection(&raw) {
            return Err(Error::FrostProtection);
        }

        Ok(Self {
            current_temp: float_field(&raw, FIELD_CURRENT_TEMP)?,
            set_temp: float_field(&raw, FIELD_SET_POINT)?,
            auto_mode: int_field(&raw, FIELD_AUTO_MODE)? == 0,
            heat_active: int_field(&raw, FIELD_HEAT_STATUS)? == 1,
            raw,
        })
    }
}

/// Wire encoding for the auto-mode command: `0` = AUTO, `1` = OFF.
pub fn auto_mode_wire_value(enabled: bool) -> u8 {
    u8::from(!enabled)
}

/// The `errorMsg` carried by a command response, if any.
pub(crate) fn rejection_message(payload: &Value) -> Option<String> {
    match payload.get(FIELD_ERROR_MSG)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn is_frost_protection(raw: &Map<String, Value>) -> bool {
    match raw.get(FIELD_FROST) {
        Some(Value::Number(n)) => n.as_i64() == Some(FROST_PROTECTION_CODE),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok() == Some(FROST_PROTECTION_CODE),
        _ => false,
    }
}

fn float_field(raw: &Map<String, Value>, key: &str) -> Result<f64, Error> {
    let parsed = match raw.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| field_error(raw, key))
}

fn int_field(raw: &Map<String, Value>, key: &str) -> Result<i64, Error> {
    let parsed = match raw.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| field_error(raw, key))
}

fn field_error(raw: &Map<String, Value>, key: &str) -> Error {
    let body = Value::Object(raw.clone()).to_string();
    Error::MalformedResponse {
        message: format!("missing or non-numeric field `{key}`"),
        body,
    }
}

fn malformed(message: &str, payload: &Value) -> Error {
    Error::MalformedResponse {
        message: message.into(),
        body: payload.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn projects_string_encoded_payload() {
        let status = DeviceStatus::from_payload(json!({
            "CH1currentRoomTemp": "21.0",
            "CH1currentSetPoint": "20.5",
            "CH1autoMode": "0",
            "CH1heatOnOffStatus": "1",
            "frost": 0
        }))
        .unwrap();

        assert!((status.current_temp - 21.0).abs() < f64::EPSILON);
        assert!((status.set_temp - 20.5).abs() < f64::EPSILON);
        assert!(status.auto_mode);
        assert!(status.heat_active);
        assert_eq!(status.raw.len(), 5);
    }

    #[test]
    fn projects_numeric_payload() {
        let status = DeviceStatus::from_payload(json!({
            "CH1currentRoomTemp": 18.5,
            "CH1currentSetPoint": 19,
            "CH1autoMode": 1,
            "CH1heatOnOffStatus": 0
        }))
        .unwrap();

        assert!((status.current_temp - 18.5).abs() < f64::EPSILON);
        assert!((status.set_temp - 19.0).abs() < f64::EPSILON);
        assert!(!status.auto_mode);
        assert!(!status.heat_active);
    }

    #[test]
    fn frost_signal_preempts_reading() {
        let result = DeviceStatus::from_payload(json!({
            "CH1currentRoomTemp": "32",
            "CH1currentSetPoint": "32",
            "CH1autoMode": "0",
            "CH1heatOnOffStatus": "0",
            "frost": 32
        }));
        assert!(matches!(result, Err(Error::FrostProtection)));
    }

    #[test]
    fn frost_signal_as_string() {
        let result = DeviceStatus::from_payload(json!({ "frost": "32" }));
        assert!(matches!(result, Err(Error::FrostProtection)));
    }

    #[test]
    fn other_frost_codes_are_ignored() {
        let status = DeviceStatus::from_payload(json!({
            "CH1currentRoomTemp": "20",
            "CH1currentSetPoint": "20",
            "CH1autoMode": "0",
            "CH1heatOnOffStatus": "0",
            "frost": 31
        }))
        .unwrap();
        assert!(status.auto_mode);
    }

    #[test]
    fn missing_field_is_malformed() {
        let result = DeviceStatus::from_payload(json!({
            "CH1currentSetPoint": "20",
            "CH1autoMode": "0",
            "CH1heatOnOffStatus": "0"
        }));
        match result {
            Err(Error::MalformedResponse { message, .. }) => {
                assert!(message.contains("CH1currentRoomTemp"), "got: {message}");
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_temperature_is_malformed() {
        let result = DeviceStatus::from_payload(json!({
            "CH1currentRoomTemp": "--",
            "CH1currentSetPoint": "20",
            "CH1autoMode": "0",
            "CH1heatOnOffStatus": "0"
        }));
        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let result = DeviceStatus::from_payload(json!(["nope"]));
        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
    }

    #[test]
    fn auto_mode_encoding_is_inverted() {
        assert_eq!(auto_mode_wire_value(true), 0);
        assert_eq!(auto_mode_wire_value(false), 1);
    }

    #[test]
    fn rejection_message_detection() {
        assert_eq!(
            rejection_message(&json!({ "errorMsg": "Invalid token" })).as_deref(),
            Some("Invalid token")
        );
        assert_eq!(rejection_message(&json!({ "errorMsg": "" })), None);
        assert_eq!(rejection_message(&json!({ "errorMsg": null })), None);
        assert_eq!(rejection_message(&json!({ "ok": 1 })), None);
        assert_eq!(rejection_message(&json!("plain text")), None);
    }
}
