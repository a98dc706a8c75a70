//! `salus run`: long-running polling with a live state stream.
//!
//! Every change of the state surface is printed as it happens. Lines of
//! the form `setTemp=21.5` or `autoMode=false` on stdin become write
//! requests, exactly as a home-automation host would issue them.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use salus_core::state::definition_of;
use salus_core::{
    Controller, StateChange, StateKey, StateStore, StateValue, ThermostatConfig, ValueKind,
};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ChangeEvent<'a> {
    at: DateTime<Utc>,
    key: StateKey,
    value: Option<&'a StateValue>,
    ack: bool,
}

pub async fn handle(
    args: RunArgs,
    mut config: ThermostatConfig,
    format: OutputFormat,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }

    let store = Arc::new(StateStore::new());
    let mut changes = store.subscribe();
    let controller = Controller::new(config, Arc::clone(&store));

    controller.start().await?;
    info!("polling started, press Ctrl-C to stop");

    let mut stdin = (!args.no_stdin).then(|| BufReader::new(tokio::io::stdin()).lines());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = changes.recv() => match change {
                Ok(change) => print_change(&change, format, global.quiet),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "output fell behind"),
                Err(RecvError::Closed) => break,
            },
            line = next_line(stdin.as_mut()) => match line {
                Some(line) => submit(&store, &line),
                // EOF: keep polling, stop reading.
                None => stdin = None,
            },
        }
    }

    controller.shutdown().await;
    info!("polling stopped");
    Ok(())
}

type StdinLines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

/// Next stdin line; pends forever once stdin is disabled.
async fn next_line(lines: Option<&mut StdinLines>) -> Option<String> {
    match lines {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => std::future::pending().await,
    }
}

fn submit(store: &StateStore, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match parse_request(line) {
        Ok((key, value)) => {
            if let Err(e) = store.request(key, value) {
                warn!(error = %e, "request not accepted");
            }
        }
        Err(reason) => warn!(input = line, "{reason}"),
    }
}

/// Parse `key=value` into a typed request for a writable state.
fn parse_request(line: &str) -> Result<(StateKey, StateValue), String> {
    let (key, raw) = line
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{line}'"))?;
    let key = key.trim();
    let key = StateKey::from_str(key).map_err(|_| format!("unknown state '{key}'"))?;
    let raw = raw.trim();

    let def = definition_of(key);
    if !def.write {
        return Err(format!("state '{key}' is read-only"));
    }

    let value = match def.kind {
        ValueKind::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(StateValue::Number),
        ValueKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "auto" | "on" | "1" => Some(StateValue::Bool(true)),
            "false" | "off" | "0" => Some(StateValue::Bool(false)),
            _ => None,
        },
        ValueKind::String => Some(StateValue::Text(raw.to_owned())),
    };

    value
        .map(|v| (key, v))
        .ok_or_else(|| format!("'{raw}' is not a valid {} for '{key}'", def.kind))
}

fn print_change(change: &StateChange, format: OutputFormat, quiet: bool) {
    let event = ChangeEvent {
        at: Utc::now(),
        key: change.key,
        value: change.value.as_ref(),
        ack: change.ack,
    };

    let line = match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(&event, true),
        OutputFormat::Yaml => format!("---\n{}", output::render_yaml(&event).trim_end()),
        OutputFormat::Table | OutputFormat::Plain => {
            let def = definition_of(change.key);
            let value = change
                .value
                .as_ref()
                .map_or_else(|| "(deleted)".to_owned(), |v| def.label(v));
            let status = if change.ack { "ack" } else { "requested" };
            format!(
                "{} {} = {value} [{status}]",
                event.at.format("%H:%M:%S"),
                change.key
            )
        }
    };
    output::print_output(&line, quiet);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_writable_requests() {
        assert_eq!(
            parse_request("setTemp=21.5").unwrap(),
            (StateKey::SetTemp, StateValue::Number(21.5))
        );
        assert_eq!(
            parse_request(" autoMode = off ").unwrap(),
            (StateKey::AutoMode, StateValue::Bool(false))
        );
        assert_eq!(
            parse_request("autoMode=AUTO").unwrap(),
            (StateKey::AutoMode, StateValue::Bool(true))
        );
    }

    #[test]
    fn rejects_read_only_and_malformed_requests() {
        assert!(parse_request("currentTemp=20").is_err());
        assert!(parse_request("setTemp").is_err());
        assert!(parse_request("setTemp=warm").is_err());
        assert!(parse_request("setTemp=NaN").is_err());
        assert!(parse_request("humidity=40").is_err());
    }
}
