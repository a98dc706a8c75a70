// ── Reactive state store ──
//
// Concurrent storage for the published surface with push-based change
// notification. Declarations and values live in separate maps so a
// re-declaration never touches a value.

use std::collections::BTreeMap;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::{PublishedState, StateChange, StateDefinition, StateKey, StateValue};
use crate::error::CoreError;

const CHANGE_CHANNEL_SIZE: usize = 64;

/// Serializable copy of every published value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub states: BTreeMap<StateKey, PublishedState>,
}

/// In-memory key/value surface shared between the controller and its host.
pub struct StateStore {
    definitions: DashMap<StateKey, StateDefinition>,
    values: DashMap<StateKey, PublishedState>,
    changes: broadcast::Sender<StateChange>,
}

impl StateStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        Self {
            definitions: DashMap::new(),
            values: DashMap::new(),
            changes,
        }
    }

    /// Seed values from a persisted snapshot without emitting changes.
    pub fn restore(snapshot: StateSnapshot) -> Self {
        let store = Self::new();
        for (key, state) in snapshot.states {
            store.values.insert(key, state);
        }
        store
    }

    // ── Declarations ─────────────────────────────────────────────────

    /// Declare a state if it does not exist yet. Returns `true` if new.
    ///
    /// An existing declaration and its value are left untouched.
    pub fn declare(&self, definition: StateDefinition) -> bool {
        let key = definition.key;
        let mut is_new = false;
        self.definitions.entry(key).or_insert_with(|| {
            is_new = true;
            definition
        });
        if is_new {
            trace!(%key, "state declared");
        }
        is_new
    }

    /// Declare every definition, returning how many were new.
    pub fn declare_all(&self, definitions: impl IntoIterator<Item = StateDefinition>) -> usize {
        let created = definitions
            .into_iter()
            .filter(|d| self.declare(d.clone()))
            .count();
        debug!(created, "state surface declared");
        created
    }

    pub fn is_declared(&self, key: StateKey) -> bool {
        self.definitions.contains_key(&key)
    }

    pub fn definition(&self, key: StateKey) -> Option<StateDefinition> {
        self.definitions.get(&key).map(|r| r.value().clone())
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Publish a device-confirmed value (`ack = true`).
    pub fn publish(&self, key: StateKey, value: impl Into<StateValue>) -> Result<(), CoreError> {
        let value = value.into();
        self.checked(key, &value)?;
        self.set(key, value, true);
        Ok(())
    }

    /// Request a change from the consumer side (`ack = false`).
    ///
    /// Only writable states accept requests.
    pub fn request(&self, key: StateKey, value: impl Into<StateValue>) -> Result<(), CoreError> {
        let value = value.into();
        let definition = self.checked(key, &value)?;
        if !definition.write {
            return Err(CoreError::State {
                message: format!("state '{key}' is read-only"),
            });
        }
        self.set(key, value, false);
        Ok(())
    }

    /// Remove a value, notifying subscribers with an empty change.
    pub fn delete(&self, key: StateKey) -> Option<PublishedState> {
        let removed = self.values.remove(&key).map(|(_, v)| v);
        if removed.is_some() {
            let _ = self.changes.send(StateChange {
                key,
                value: None,
                ack: false,
            });
        }
        removed
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, key: StateKey) -> Option<PublishedState> {
        self.values.get(&key).map(|r| r.value().clone())
    }

    pub fn value(&self, key: StateKey) -> Option<StateValue> {
        self.values.get(&key).map(|r| r.value().value.clone())
    }

    /// Subscribe to every change, acknowledged or not.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            states: self
                .values
                .iter()
                .map(|r| (*r.key(), r.value().clone()))
                .collect(),
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn checked(&self, key: StateKey, value: &StateValue) -> Result<StateDefinition, CoreError> {
        let definition = self.definition(key).ok_or_else(|| CoreError::State {
            message: format!("state '{key}' is not declared"),
        })?;
        if !definition.accepts(value) {
            return Err(CoreError::State {
                message: format!(
                    "state '{key}' expects a {} value, got {}",
                    definition.kind,
                    value.kind()
                ),
            });
        }
        Ok(definition)
    }

    fn set(&self, key: StateKey, value: StateValue, ack: bool) {
        self.values.insert(
            key,
            PublishedState {
                value: value.clone(),
                ack,
                updated_at: Utc::now(),
            },
        );
        // No receivers is not an error.
        let _ = self.changes.send(StateChange {
            key,
            value: Some(value),
            ack,
        });
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::state::{definition_of, definitions};

    fn declared() -> StateStore {
        let store = StateStore::new();
        store.declare_all(definitions());
        store
    }

    #[test]
    fn publish_requires_declaration() {
        let store = StateStore::new();
        let err = store.publish(StateKey::CurrentTemp, 21.0).unwrap_err();
        assert!(matches!(err, CoreError::State { .. }));
        assert!(store.get(StateKey::CurrentTemp).is_none());
    }

    #[test]
    fn publish_acknowledges_and_notifies() {
        let store = declared();
        let mut rx = store.subscribe();

        store.publish(StateKey::CurrentTemp, 21.5).unwrap();

        let state = store.get(StateKey::CurrentTemp).unwrap();
        assert_eq!(state.value, StateValue::Number(21.5));
        assert!(state.ack);

        let change = rx.try_recv().unwrap();
        assert_eq!(
            change,
            StateChange {
                key: StateKey::CurrentTemp,
                value: Some(StateValue::Number(21.5)),
                ack: true,
            }
        );
    }

    #[test]
    fn request_is_unacknowledged() {
        let store = declared();
        store.request(StateKey::SetTemp, 23.0).unwrap();
        assert!(!store.get(StateKey::SetTemp).unwrap().ack);
    }

    #[test]
    fn request_rejects_read_only_and_mistyped_values() {
        let store = declared();
        assert!(store.request(StateKey::CurrentTemp, 23.0).is_err());
        assert!(store.request(StateKey::SetTemp, "23").is_err());
        assert!(store.request(StateKey::AutoMode, 1.0).is_err());
    }

    #[test]
    fn redeclaring_keeps_existing_value() {
        let store = declared();
        store.publish(StateKey::SetTemp, 19.0).unwrap();

        assert_eq!(store.declare_all(definitions()), 0);
        assert!(!store.declare(definition_of(StateKey::SetTemp)));
        assert_eq!(store.value(StateKey::SetTemp), Some(StateValue::Number(19.0)));
    }

    #[test]
    fn delete_emits_valueless_change() {
        let store = declared();
        store.publish(StateKey::DeviceId, "D1").unwrap();
        let mut rx = store.subscribe();

        assert!(store.delete(StateKey::DeviceId).is_some());
        let change = rx.try_recv().unwrap();
        assert_eq!(change.value, None);
        assert!(store.delete(StateKey::DeviceId).is_none());
    }

    #[test]
    fn snapshot_restores_values() {
        let store = declared();
        store.publish(StateKey::Connection, true).unwrap();
        store.publish(StateKey::SetTemp, 20.5).unwrap();

        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let restored = StateStore::restore(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.snapshot(), store.snapshot());
        assert!(!restored.is_declared(StateKey::SetTemp));
    }
}
