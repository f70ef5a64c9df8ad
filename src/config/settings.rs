//! User settings for ControlClose
//!
//! Manages preferences that change how closes are validated and displayed.

use serde::{Deserialize, Serialize};

use super::paths::ControlClosePaths;
use crate::error::CloseError;

/// How blank or missing amounts in a close form are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    /// Blank amounts count as zero
    #[default]
    Coerce,
    /// Blank required amounts block submission
    Reject,
}

impl InputPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "coerce" => Some(Self::Coerce),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Application settings persisted in `config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol used when printing amounts
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Blank amount handling for the close wizard
    #[serde(default)]
    pub numeric_input: InputPolicy,

    /// Reject a second close for the same store and date
    #[serde(default = "default_true")]
    pub enforce_unique_close: bool,

    /// Send a summary after each submitted close
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Whether `init` has been run
    #[serde(default)]
    pub setup_completed: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "€".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            numeric_input: InputPolicy::default(),
            enforce_unique_close: true,
            notifications_enabled: true,
            setup_completed: false,
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &ControlClosePaths) -> Result<Self, CloseError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| CloseError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                CloseError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ControlClosePaths) -> Result<(), CloseError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| CloseError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| CloseError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
