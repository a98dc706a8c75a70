//! `salus status`: one-shot login and read.

use serde::Serialize;

use salus_core::{Controller, CoreError, DeviceStatus, ThermostatConfig};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct StatusView {
    device_id: Option<String>,
    current_temp: f64,
    set_temp: f64,
    mode: &'static str,
    heating: bool,
}

impl StatusView {
    fn new(status: &DeviceStatus, device_id: Option<String>) -> Self {
        Self {
            device_id,
            current_temp: status.current_temp,
            set_temp: status.set_temp,
            mode: if status.auto_mode { "auto" } else { "off" },
            heating: status.heat_active,
        }
    }
}

pub async fn handle(
    config: ThermostatConfig,
    format: OutputFormat,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (status, device_id) = Controller::oneshot(config, |c| async move {
        let status = c.read_once().await?;
        Ok::<_, CoreError>((status, c.device_id()))
    })
    .await?;

    let view = StatusView::new(&status, device_id);
    let color = format == OutputFormat::Table && output::should_color(global.color);

    let out = output::render_single(format, &view, |v| {
        vec![
            (
                "device_id".into(),
                v.device_id.clone().unwrap_or_default(),
            ),
            ("current_temp".into(), format!("{} °C", v.current_temp)),
            ("set_temp".into(), format!("{} °C", v.set_temp)),
            ("mode".into(), v.mode.to_owned()),
            (
                "heating".into(),
                output::highlight(if v.heating { "on" } else { "off" }, v.heating, color),
            ),
        ]
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
