//! One-shot writes: `salus set-temp` and `salus mode`.

use tracing::{debug, warn};

use salus_core::state::definition_of;
use salus_core::{Controller, StateKey, ThermostatConfig};

use crate::cli::{GlobalOpts, ModeArgs, SetTempArgs};
use crate::error::CliError;

pub async fn set_temp(
    args: SetTempArgs,
    config: ThermostatConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let value = args.value;
    if !value.is_finite() {
        return Err(CliError::Validation {
            field: "value".into(),
            reason: "temperature must be a finite number".into(),
        });
    }

    // The portal decides; only warn outside the recommended range.
    let def = definition_of(StateKey::SetTemp);
    if let (Some(min), Some(max)) = (def.min, def.max) {
        if !(min..=max).contains(&value) {
            warn!(value, min, max, "target temperature outside the recommended range");
        }
    }

    let confirmation =
        Controller::oneshot(config, |c| async move { c.set_temperature(value).await }).await?;
    debug!(%confirmation, "portal confirmation");

    if !global.quiet {
        eprintln!("✓ Target temperature set to {value} °C");
    }
    Ok(())
}

pub async fn set_mode(
    args: ModeArgs,
    config: ThermostatConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let enabled = args.mode.is_auto();

    let confirmation =
        Controller::oneshot(config, |c| async move { c.set_auto_mode(enabled).await }).await?;
    debug!(%confirmation, "portal confirmation");

    if !global.quiet {
        let label = if enabled { "AUTO" } else { "OFF" };
        eprintln!("✓ Mode set to {label}");
    }
    Ok(())
}
