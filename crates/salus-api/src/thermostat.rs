// Thermostat operations
//
// Status read and the two write commands, all routed through
// `PortalSession::call` for lazy login and bounded re-authentication.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::Error;
use crate::models::{DeviceStatus, auto_mode_wire_value, rejection_message};
use crate::session::{PortalCall, PortalSession};

impl PortalSession {
    /// Read the current thermostat status.
    ///
    /// Fails with [`Error::FrostProtection`] while the device reports
    /// frost protection; that is never turned into a reading.
    pub async fn read(&self) -> Result<DeviceStatus, Error> {
        let payload = self.call(&PortalCall::Status).await?;

        match DeviceStatus::from_payload(payload) {
            Err(Error::FrostProtection) => {
                warn!("device is in frost protection mode");
                Err(Error::FrostProtection)
            }
            other => other,
        }
    }

    /// Set the target temperature (°C).
    ///
    /// No range check is applied; the portal is authoritative.
    /// Returns the portal's confirmation payload.
    pub async fn set_temperature(&self, value: f64) -> Result<Value, Error> {
        let call = PortalCall::Command(vec![
            ("tempUnit", "0".into()),
            ("current_tempZ1_set", "1".into()),
            ("current_tempZ1", value.to_string()),
        ]);

        let data = self.call(&call).await?;
        reject_if_error(&data)?;

        info!(temperature = value, "target temperature set");
        Ok(data)
    }

    /// Switch between AUTO (`true`) and OFF (`false`).
    pub async fn set_auto_mode(&self, enabled: bool) -> Result<Value, Error> {
        let call = PortalCall::Command(vec![
            ("auto_setZ1", "1".into()),
            ("auto", auto_mode_wire_value(enabled).to_string()),
        ]);

        let data = self.call(&call).await?;
        reject_if_error(&data)?;

        let mode = if enabled { "AUTO" } else { "OFF" };
        info!(mode, "mode set");
        Ok(data)
    }

    /// Whether the boiler is currently firing.
    pub async fn heat_status(&self) -> Result<bool, Error> {
        Ok(self.read().await?.heat_active)
    }
}

fn reject_if_error(data: &Value) -> Result<(), Error> {
    match rejection_message(data) {
        Some(message) => Err(Error::RemoteRejected { message }),
        None => Ok(()),
    }
}
