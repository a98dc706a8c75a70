//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;

use salus_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            println!("{}", salus_config::config_path().display());
            Ok(())
        }
        ConfigCommand::SetPassword { username } => set_password(username, global),
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = salus_config::config_path();
    eprintln!("Salus IT500 -- configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let username: String = Input::new()
        .with_prompt("Portal account (e-mail)")
        .interact_text()
        .map_err(prompt_err)?;

    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;

    if username.trim().is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }

    let store_choices = &[
        "Store password in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let password_field = if store_selection == 0 {
        salus_config::store_password(&username, &SecretString::from(password))?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        Some(password)
    };

    let poll_interval: u64 = Input::new()
        .with_prompt("Polling interval (seconds, minimum 30)")
        .default(salus_core::config::DEFAULT_POLL_INTERVAL_SECS)
        .interact_text()
        .map_err(prompt_err)?;

    let cfg = Config {
        username: Some(username),
        password: password_field,
        poll_interval,
        ..Config::default()
    };

    let path = salus_config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("\n  Test it: salus status");
    Ok(())
}

// ── Show ────────────────────────────────────────────────────────────

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = crate::config::load_with_overrides(global)?;
    if cfg.password.is_some() {
        cfg.password = Some("********".into());
    }

    let format = output::resolve_format(global, &cfg.output);
    let out = output::render_single(format, &cfg, |c| {
        vec![
            ("username".into(), c.username.clone().unwrap_or_default()),
            (
                "password".into(),
                c.password.clone().unwrap_or_else(|| "(keyring / env)".into()),
            ),
            ("portal_url".into(), c.portal_url.clone()),
            ("poll_interval".into(), c.poll_interval.to_string()),
            ("timeout".into(), c.timeout.to_string()),
            ("output".into(), c.output.clone()),
        ]
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── SetPassword ─────────────────────────────────────────────────────

fn set_password(username: Option<String>, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = crate::config::load_with_overrides(global)?;
    let username = username
        .or(cfg.username)
        .ok_or_else(|| CliError::NoCredentials {
            missing: "username".into(),
        })?;

    let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "value cannot be empty".into(),
        });
    }

    salus_config::store_password(&username, &SecretString::from(secret))?;
    eprintln!("✓ Password stored in system keyring for '{username}'");
    Ok(())
}
