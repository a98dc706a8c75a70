//! Command handlers.

pub mod config_cmd;
mod control;
mod run;
mod status;

use salus_core::ThermostatConfig;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Route a portal command to its handler.
pub async fn dispatch(
    cmd: Command,
    config: ThermostatConfig,
    format: OutputFormat,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(args, config, format, global).await,
        Command::Status => status::handle(config, format, global).await,
        Command::SetTemp(args) => control::set_temp(args, config, global).await,
        Command::Mode(args) => control::set_mode(args, config, global).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
