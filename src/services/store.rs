//! Store service
//!
//! CRUD for stores plus activation. Stores are never deleted: closes keep
//! referencing them, so retiring a shop means deactivating it.

use tracing::info;

use crate::audit::EntityType;
use crate::error::{CloseError, CloseResult};
use crate::models::{Money, Store, StoreId};
use crate::storage::Storage;

/// Partial update of a store; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub opening_cash_fund: Option<Money>,
    /// `Some("")` clears the recipients
    pub email_destinations: Option<String>,
    pub active: Option<bool>,
}

/// Service for store management
pub struct StoreService<'a> {
    storage: &'a Storage,
}

impl<'a> StoreService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new store
    pub fn create(
        &self,
        name: &str,
        opening_cash_fund: Money,
        email_destinations: Option<&str>,
    ) -> CloseResult<Store> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CloseError::Validation("Store name cannot be empty".into()));
        }

        if self.storage.stores.name_exists(name, None)? {
            return Err(CloseError::Duplicate {
                entity_type: "Store",
                identifier: name.to_string(),
            });
        }

        let mut store = Store::new(name, opening_cash_fund);
        store.email_destinations = email_destinations
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        store
            .validate()
            .map_err(|e| CloseError::Validation(e.to_string()))?;

        self.storage.stores.upsert(store.clone())?;
        self.storage.stores.save()?;

        self.storage.log_create(
            EntityType::Store,
            store.id.to_string(),
            Some(store.name.clone()),
            &store,
        )?;

        info!(store = %store.name, fund = %store.opening_cash_fund, "store created");
        Ok(store)
    }

    pub fn get(&self, id: StoreId) -> CloseResult<Option<Store>> {
        self.storage.stores.get(id)
    }

    /// Find a store by name or ID string
    pub fn find(&self, identifier: &str) -> CloseResult<Option<Store>> {
        if let Some(store) = self.storage.stores.get_by_name(identifier)? {
            return Ok(Some(store));
        }

        if let Ok(id) = identifier.parse::<StoreId>() {
            return self.storage.stores.get(id);
        }

        // Short display form (`sto-1a2b3c4d`)
        let wanted = identifier.trim();
        Ok(self
            .storage
            .stores
            .get_all()?
            .into_iter()
            .find(|s| s.id.to_string() == wanted))
    }

    /// Like `find`, but a missing store is an error
    pub fn resolve(&self, identifier: &str) -> CloseResult<Store> {
        self.find(identifier)?
            .ok_or_else(|| CloseError::store_not_found(identifier))
    }

    /// List stores sorted by name
    pub fn list(&self, include_inactive: bool) -> CloseResult<Vec<Store>> {
        if include_inactive {
            self.storage.stores.get_all()
        } else {
            self.storage.stores.get_active()
        }
    }

    /// Apply a partial update
    pub fn update(&self, id: StoreId, changes: StoreUpdate) -> CloseResult<Store> {
        let mut store = self
            .storage
            .stores
            .get(id)?
            .ok_or_else(|| CloseError::store_not_found(id.to_string()))?;
        let before = store.clone();

        if let Some(name) = changes.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CloseError::Validation("Store name cannot be empty".into()));
            }
            if self.storage.stores.name_exists(name, Some(id))? {
                return Err(CloseError::Duplicate {
                    entity_type: "Store",
                    identifier: name.to_string(),
                });
            }
            store.name = name.to_string();
        }

        if let Some(fund) = changes.opening_cash_fund {
            store.opening_cash_fund = fund;
        }

        if let Some(emails) = changes.email_destinations {
            let emails = emails.trim();
            store.email_destinations = (!emails.is_empty()).then(|| emails.to_string());
        }

        if let Some(active) = changes.active {
            store.active = active;
        }

        store.updated_at = chrono::Utc::now();
        store
            .validate()
            .map_err(|e| CloseError::Validation(e.to_string()))?;

        self.storage.stores.upsert(store.clone())?;
        self.storage.stores.save()?;

        self.storage.log_update(
            EntityType::Store,
            store.id.to_string(),
            Some(store.name.clone()),
            &before,
            &store,
        )?;

        info!(store = %store.name, "store updated");
        Ok(store)
    }

    pub fn set_active(&self, id: StoreId, active: bool) -> CloseResult<Store> {
        self.update(
            id,
            StoreUpdate {
                active: Some(active),
                ..Default::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ControlClosePaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ControlClosePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_and_find() {
        let (_temp_dir, storage) = create_test_storage();
        let service = StoreService::new(&storage);

        let store = service
            .create("Centro", Money::from_cents(20000), Some(" boss@shop.it "))
            .unwrap();
        assert_eq!(store.email_destinations.as_deref(), Some("boss@shop.it"));

        assert_eq!(service.find("centro").unwrap().unwrap().id, store.id);
        assert_eq!(service.find(&store.id.as_uuid().to_string()).unwrap().unwrap().id, store.id);
        assert!(service.resolve("Nowhere").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = StoreService::new(&storage);

        service.create("Centro", Money::zero(), None).unwrap();
        assert!(matches!(
            service.create("CENTRO", Money::zero(), None),
            Err(CloseError::Duplicate { .. })
        ));
        assert!(service.create("  ", Money::zero(), None).unwrap_err().is_validation());
    }

    #[test]
    fn test_negative_fund_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = StoreService::new(&storage);

        let err = service.create("Centro", Money::from_cents(-100), None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_partial_update_and_audit() {
        let (_temp_dir, storage) = create_test_storage();
        let service = StoreService::new(&storage);
        let store = service.create("Centro", Money::from_cents(10000), None).unwrap();

        let updated = service
            .update(
                store.id,
                StoreUpdate {
                    opening_cash_fund: Some(Money::from_cents(15000)),
                    email_destinations: Some("a@shop.it,b@shop.it".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Centro");
        assert_eq!(updated.opening_cash_fund.cents(), 15000);
        assert_eq!(updated.recipients().len(), 2);

        let cleared = service
            .update(
                store.id,
                StoreUpdate {
                    email_destinations: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(cleared.email_destinations.is_none());

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_deactivate_hides_from_active_list() {
        let (_temp_dir, storage) = create_test_storage();
        let service = StoreService::new(&storage);
        let store = service.create("Centro", Money::zero(), None).unwrap();
        service.create("Stazione", Money::zero(), None).unwrap();

        service.set_active(store.id, false).unwrap();

        assert_eq!(service.list(false).unwrap().len(), 1);
        assert_eq!(service.list(true).unwrap().len(), 2);
    }
}
