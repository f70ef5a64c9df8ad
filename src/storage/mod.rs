//! Storage layer for ControlClose
//!
//! JSON file tables with atomic writes, a file-backed receipt blob store and
//! the audit trail, all rooted at the paths from `ControlClosePaths`.

pub mod closes;
pub mod company;
pub mod file_io;
pub mod init;
pub mod payment_methods;
pub mod profiles;
pub mod receipts;
pub mod stores;

pub use closes::CloseRepository;
pub use company::CompanyRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use payment_methods::PaymentMethodRepository;
pub use profiles::ProfileRepository;
pub use receipts::ReceiptStore;
pub use stores::StoreRepository;

use serde::Serialize;

use crate::audit::{generate_diff, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::ControlClosePaths;
use crate::error::CloseResult;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: ControlClosePaths,
    audit: AuditLogger,
    pub stores: StoreRepository,
    pub payment_methods: PaymentMethodRepository,
    pub closes: CloseRepository,
    pub profiles: ProfileRepository,
    pub company: CompanyRepository,
    pub receipts: ReceiptStore,
}

impl Storage {
    /// Create a storage instance and make sure its directories exist
    pub fn new(paths: ControlClosePaths) -> CloseResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            stores: StoreRepository::new(paths.stores_file()),
            payment_methods: PaymentMethodRepository::new(paths.payment_methods_file()),
            closes: CloseRepository::new(paths.closes_file()),
            profiles: ProfileRepository::new(paths.profiles_file()),
            company: CompanyRepository::new(paths.company_file()),
            receipts: ReceiptStore::new(paths.receipts_dir()),
            paths,
        })
    }

    pub fn paths(&self) -> &ControlClosePaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&self) -> CloseResult<()> {
        self.stores.load()?;
        self.payment_methods.load()?;
        self.closes.load()?;
        self.profiles.load()?;
        self.company.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> CloseResult<()> {
        self.stores.save()?;
        self.payment_methods.save()?;
        self.closes.save()?;
        self.profiles.save()?;
        self.company.save()?;
        Ok(())
    }

    /// Check if storage has been initialized (settings file present)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> CloseResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Record an update; the diff is computed from the two snapshots
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> CloseResult<()> {
        let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
            (Ok(b), Ok(a)) => generate_diff(&b, &a),
            _ => None,
        };
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> CloseResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::models::{Money, Store};
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ControlClosePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("receipts").exists());
        assert!(!storage.is_initialized());
        storage.load_all().unwrap();
        assert_eq!(storage.stores.count().unwrap(), 0);
    }

    #[test]
    fn test_log_update_records_diff() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ControlClosePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        let before = Store::new("Centro", Money::from_cents(10000));
        let mut after = before.clone();
        after.opening_cash_fund = Money::from_cents(12000);

        storage
            .log_update(
                EntityType::Store,
                before.id.to_string(),
                Some(before.name.clone()),
                &before,
                &after,
            )
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Update);
        assert_eq!(
            entries[0].diff_summary.as_deref(),
            Some("opening_cash_fund: 10000 -> 12000")
        );
    }
}
