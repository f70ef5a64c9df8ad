//! Storage initialization
//!
//! First-run setup: directories plus the default payment methods every shop
//! starts with.

use crate::config::paths::ControlClosePaths;
use crate::error::CloseResult;
use crate::models::PaymentMethod;

use super::file_io::write_json_atomic;
use super::payment_methods::PaymentMethodData;

/// Payment methods seeded on a fresh installation: (name, is_cash)
pub const DEFAULT_PAYMENT_METHODS: &[(&str, bool)] = &[("Contanti", true), ("POS", false)];

/// Initialize storage for a fresh installation
pub fn initialize_storage(paths: &ControlClosePaths) -> CloseResult<()> {
    paths.ensure_directories()?;

    if !paths.payment_methods_file().exists() {
        let data = PaymentMethodData {
            payment_methods: DEFAULT_PAYMENT_METHODS
                .iter()
                .map(|(name, is_cash)| PaymentMethod::new(*name, *is_cash))
                .collect(),
        };
        write_json_atomic(paths.payment_methods_file(), &data)?;
    }

    Ok(())
}

pub fn needs_initialization(paths: &ControlClosePaths) -> bool {
    !paths.payment_methods_file().exists()
}
