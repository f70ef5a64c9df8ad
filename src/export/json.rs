//! JSON Export functionality
//!
//! Exports the complete database to JSON format with schema versioning.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CloseError, CloseResult};
use crate::models::{CashClose, CompanySettings, PaymentMethod, Profile, Store};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full database export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub company: Option<CompanySettings>,
    pub stores: Vec<Store>,
    pub payment_methods: Vec<PaymentMethod>,

    /// Closes with their payments and expenses
    pub closes: Vec<CashClose>,

    pub profiles: Vec<Profile>,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub store_count: usize,
    pub payment_method_count: usize,
    pub close_count: usize,
    pub profile_count: usize,
    /// Closes with a receipt image attached
    pub receipt_count: usize,
    pub earliest_close: Option<String>,
    pub latest_close: Option<String>,
}

impl FullExport {
    pub fn from_storage(storage: &Storage) -> CloseResult<Self> {
        let company = storage.company.get()?;
        let stores = storage.stores.get_all()?;
        let payment_methods = storage.payment_methods.get_all()?;
        let closes = storage.closes.get_all()?;
        let profiles = storage.profiles.get_all()?;

        let metadata = ExportMetadata {
            store_count: stores.len(),
            payment_method_count: payment_methods.len(),
            close_count: closes.len(),
            profile_count: profiles.len(),
            receipt_count: closes.iter().filter(|c| c.receipt_image.is_some()).count(),
            earliest_close: closes.iter().map(|c| c.date).min().map(|d| d.to_string()),
            latest_close: closes.iter().map(|c| c.date).max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            company,
            stores,
            payment_methods,
            closes,
            profiles,
            metadata,
        })
    }

    /// Check the schema version, stored invariants and references
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let store_ids: HashSet<_> = self.stores.iter().map(|s| s.id).collect();
        let method_ids: HashSet<_> = self.payment_methods.iter().map(|m| m.id).collect();

        for close in &self.closes {
            if !store_ids.contains(&close.store_id) {
                return Err(format!(
                    "Close {} references unknown store {}",
                    close.id, close.store_id
                ));
            }
            if let Some(payment) = close
                .payments
                .iter()
                .find(|p| !method_ids.contains(&p.payment_method_id))
            {
                return Err(format!(
                    "Close {} references unknown payment method {}",
                    close.id, payment.payment_method_id
                ));
            }
            close
                .validate()
                .map_err(|e| format!("Close {}: {}", close.id, e))?;
        }

        for profile in &self.profiles {
            if let Some(store) = profile.allowed_stores.iter().find(|s| !store_ids.contains(*s)) {
                return Err(format!(
                    "Profile {} is assigned to unknown store {}",
                    profile.username, store
                ));
            }
        }

        Ok(())
    }
}

/// Export the full database to JSON
pub fn export_full_json<W: Write>(storage: &Storage, writer: W, pretty: bool) -> CloseResult<()> {
    let export = FullExport::from_storage(storage)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| CloseError::Export(e.to_string()))?;

    Ok(())
}

/// Read a JSON export back and validate it
pub fn read_json_export(json_str: &str) -> CloseResult<FullExport> {
    let export: FullExport = serde_json::from_str(json_str)?;
    export.validate().map_err(CloseError::Export)?;
    Ok(export)
}
