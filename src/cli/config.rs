//! Configuration CLI commands

use clap::Subcommand;

use crate::auth::Route;
use crate::config::settings::{InputPolicy, Settings};
use crate::error::{CloseError, CloseResult};
use crate::models::WARNING_THRESHOLD;

use super::CliContext;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show paths and settings
    Show,
    /// Change a setting
    ///
    /// Keys: currency, date-format, numeric-input (coerce|reject),
    /// enforce-unique (true|false), notifications (true|false)
    Set { key: String, value: String },
}

pub fn handle_config_command(ctx: &CliContext, cmd: ConfigCommands) -> CloseResult<()> {
    let paths = ctx.storage.paths();

    match cmd {
        ConfigCommands::Show => {
            let settings = ctx.settings;
            println!("ControlClose Configuration");
            println!("==========================");
            println!("Base directory:     {}", paths.base_dir().display());
            println!("Data directory:     {}", paths.data_dir().display());
            println!("Receipts directory: {}", paths.receipts_dir().display());
            println!("Audit log:          {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency:          {}", settings.currency_symbol);
            println!("  Date format:       {}", settings.date_format);
            println!("  Numeric input:     {}", policy_name(settings.numeric_input));
            println!("  Unique close/day:  {}", settings.enforce_unique_close);
            println!("  Notifications:     {}", settings.notifications_enabled);
            println!(
                "  Warning threshold: {}",
                ctx.money(WARNING_THRESHOLD)
            );
        }
        ConfigCommands::Set { key, value } => {
            ctx.authorize(Route::Admin)?;
            let mut settings = ctx.settings.clone();
            apply_setting(&mut settings, &key, &value)?;
            settings.save(paths)?;
            println!("{} = {}", key, value.trim());
        }
    }

    Ok(())
}

fn policy_name(policy: InputPolicy) -> &'static str {
    match policy {
        InputPolicy::Coerce => "coerce",
        InputPolicy::Reject => "reject",
    }
}

fn apply_setting(settings: &mut Settings, key: &str, value: &str) -> CloseResult<()> {
    let value = value.trim();
    match key {
        "currency" => settings.currency_symbol = value.to_string(),
        "date-format" => {
            if value.is_empty() {
                return Err(CloseError::Validation("Date format cannot be empty".into()));
            }
            settings.date_format = value.to_string();
        }
        "numeric-input" => {
            settings.numeric_input = InputPolicy::parse(value).ok_or_else(|| {
                CloseError::Validation(format!("Invalid policy '{}'. Use coerce or reject", value))
            })?;
        }
        "enforce-unique" => settings.enforce_unique_close = parse_bool(value)?,
        "notifications" => settings.notifications_enabled = parse_bool(value)?,
        other => {
            return Err(CloseError::Config(format!("Unknown setting '{}'", other)));
        }
    }
    Ok(())
}

fn parse_bool(value: &str) -> CloseResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => Err(CloseError::Validation(format!(
            "Expected true or false, got '{}'",
            value
        ))),
    }
}
