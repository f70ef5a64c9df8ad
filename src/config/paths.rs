//! Path management for ControlClose
//!
//! ## Path Resolution Order
//!
//! 1. `CONTROLCLOSE_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory reported by `directories`
//!    (`~/.config/controlclose` on Linux, `%APPDATA%\controlclose` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::CloseError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "CONTROLCLOSE_DATA_DIR";

/// Manages all paths used by ControlClose
#[derive(Debug, Clone)]
pub struct ControlClosePaths {
    base_dir: PathBuf,
}

impl ControlClosePaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, CloseError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the receipt blob directory (`<base>/receipts/`)
    pub fn receipts_dir(&self) -> PathBuf {
        self.base_dir.join("receipts")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the outbound notification log
    pub fn outbox_file(&self) -> PathBuf {
        self.base_dir.join("outbox.log")
    }

    pub fn stores_file(&self) -> PathBuf {
        self.data_dir().join("stores.json")
    }

    pub fn payment_methods_file(&self) -> PathBuf {
        self.data_dir().join("payment_methods.json")
    }

    /// Get the path to closes.json (close headers with payments and expenses)
    pub fn closes_file(&self) -> PathBuf {
        self.data_dir().join("closes.json")
    }

    /// Get the path to profiles.json (profiles and their store assignments)
    pub fn profiles_file(&self) -> PathBuf {
        self.data_dir().join("profiles.json")
    }

    pub fn company_file(&self) -> PathBuf {
        self.data_dir().join("company.json")
    }

    /// Ensure the base, data and receipt directories exist
    pub fn ensure_directories(&self) -> Result<(), CloseError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| CloseError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| CloseError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.receipts_dir())
            .map_err(|e| CloseError::Io(format!("Failed to create receipts directory: {}", e)))?;

        Ok(())
    }

    /// Check if ControlClose has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, CloseError> {
    ProjectDirs::from("", "", "controlclose")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| CloseError::Config("Could not determine a home directory".into()))
}
