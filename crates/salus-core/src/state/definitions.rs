// State metadata declared for every key of the surface.

use serde::Serialize;
use strum::IntoEnumIterator;

use super::{StateKey, StateValue};

/// Value type of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    Boolean,
    Number,
    String,
}

/// Declared metadata of a state: what a host needs to render and
/// validate it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDefinition {
    pub key: StateKey,
    pub name: &'static str,
    pub kind: ValueKind,
    pub role: &'static str,
    pub read: bool,
    pub write: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Display labels for boolean states, as `(true, false)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<(&'static str, &'static str)>,
}

impl StateDefinition {
    /// Whether `value` has this state's type.
    pub fn accepts(&self, value: &StateValue) -> bool {
        value.kind() == self.kind
    }

    /// Human label for a value, falling back to its plain rendering.
    pub fn label(&self, value: &StateValue) -> String {
        match (self.labels, value) {
            (Some((on, _)), StateValue::Bool(true)) => on.to_owned(),
            (Some((_, off)), StateValue::Bool(false)) => off.to_owned(),
            (_, v) => match self.unit {
                Some(unit) => format!("{v} {unit}"),
                None => v.to_string(),
            },
        }
    }
}

/// Definition of a single key.
pub fn definition_of(key: StateKey) -> StateDefinition {
    let base = StateDefinition {
        key,
        name: "",
        kind: ValueKind::Boolean,
        role: "state",
        read: true,
        write: false,
        unit: None,
        min: None,
        max: None,
        labels: None,
    };

    match key {
        StateKey::Connection => StateDefinition {
            name: "Device connection",
            role: "indicator.connected",
            ..base
        },
        StateKey::CurrentTemp => StateDefinition {
            name: "Current room temperature",
            kind: ValueKind::Number,
            role: "value.temperature",
            unit: Some("°C"),
            ..base
        },
        StateKey::SetTemp => StateDefinition {
            name: "Target temperature",
            kind: ValueKind::Number,
            role: "level.temperature",
            write: true,
            unit: Some("°C"),
            min: Some(5.0),
            max: Some(35.0),
            ..base
        },
        StateKey::AutoMode => StateDefinition {
            name: "Auto mode",
            role: "switch",
            write: true,
            labels: Some(("AUTO", "OFF")),
            ..base
        },
        StateKey::HeatStatus => StateDefinition {
            name: "Heating status",
            role: "indicator.working",
            labels: Some(("Heating", "Off")),
            ..base
        },
        StateKey::DeviceId => StateDefinition {
            name: "Device ID",
            kind: ValueKind::String,
            role: "info.name",
            ..base
        },
    }
}

/// Definitions of the whole surface, in declaration order.
pub fn definitions() -> Vec<StateDefinition> {
    StateKey::iter().map(definition_of).collect()
}
