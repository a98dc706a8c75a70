//! Clap derive structures for the `salus` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// salus -- command-line client for Salus IT500 thermostats
#[derive(Debug, Parser)]
#[command(
    name = "salus",
    version,
    about = "Read and control a Salus IT500 thermostat from the command line",
    long_about = "Talks to the Salus IT500 web portal with your account credentials.\n\n\
        One-shot commands read or change the thermostat; `salus run` keeps\n\
        polling and streams every state change until interrupted.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Portal account (overrides config)
    #[arg(long, short = 'u', env = "SALUS_USERNAME", global = true)]
    pub username: Option<String>,

    /// Portal base URL (overrides config)
    #[arg(long, env = "SALUS_PORTAL_URL", global = true)]
    pub portal_url: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "SALUS_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SALUS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain `key=value` lines (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the thermostat and stream state changes until Ctrl-C
    Run(RunArgs),

    /// Show the current thermostat status
    #[command(alias = "st")]
    Status,

    /// Set the target temperature (°C)
    #[command(name = "set-temp", alias = "temp")]
    SetTemp(SetTempArgs),

    /// Switch between schedule (auto) and off
    Mode(ModeArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Polling interval in seconds (minimum 30)
    #[arg(long, short = 'i', env = "SALUS_POLL_INTERVAL")]
    pub interval: Option<u64>,

    /// Do not read `key=value` write requests from stdin
    #[arg(long)]
    pub no_stdin: bool,
}

#[derive(Debug, Args)]
pub struct SetTempArgs {
    /// Target temperature in °C
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
}

#[derive(Debug, Args)]
pub struct ModeArgs {
    /// Thermostat mode
    pub mode: ThermostatMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThermostatMode {
    /// Follow the programmed schedule
    Auto,
    /// Heating off
    Off,
}

impl ThermostatMode {
    pub fn is_auto(self) -> bool {
        self == Self::Auto
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init,

    /// Display the current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Store the portal password in the system keyring
    SetPassword {
        /// Account to store the password for [default: configured username]
        #[arg(long)]
        username: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
