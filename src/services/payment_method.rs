//! Payment method service

use tracing::info;

use crate::audit::EntityType;
use crate::error::{CloseError, CloseResult};
use crate::models::{PaymentMethod, PaymentMethodId};
use crate::storage::Storage;

#[derive(Debug, Clone, Default)]
pub struct PaymentMethodUpdate {
    pub name: Option<String>,
    pub is_cash: Option<bool>,
    pub active: Option<bool>,
}

/// Service for payment method management
pub struct PaymentMethodService<'a> {
    storage: &'a Storage,
}

impl<'a> PaymentMethodService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, name: &str, is_cash: bool) -> CloseResult<PaymentMethod> {
        let name = name.trim();
        if self.storage.payment_methods.name_exists(name, None)? {
            return Err(CloseError::Duplicate {
                entity_type: "Payment method",
                identifier: name.to_string(),
            });
        }

        let method = PaymentMethod::new(name, is_cash);
        method.validate().map_err(CloseError::Validation)?;

        self.storage.payment_methods.upsert(method.clone())?;
        self.storage.payment_methods.save()?;

        self.storage.log_create(
            EntityType::PaymentMethod,
            method.id.to_string(),
            Some(method.name.clone()),
            &method,
        )?;

        info!(method = %method.name, is_cash, "payment method created");
        Ok(method)
    }

    pub fn get(&self, id: PaymentMethodId) -> CloseResult<Option<PaymentMethod>> {
        self.storage.payment_methods.get(id)
    }

    /// Find a payment method by name, full id or short id
    pub fn find(&self, identifier: &str) -> CloseResult<Option<PaymentMethod>> {
        if let Some(method) = self.storage.payment_methods.get_by_name(identifier)? {
            return Ok(Some(method));
        }

        if let Ok(id) = identifier.parse::<PaymentMethodId>() {
            return self.storage.payment_methods.get(id);
        }

        let wanted = identifier.trim();
        Ok(self
            .storage
            .payment_methods
            .get_all()?
            .into_iter()
            .find(|m| m.id.to_string() == wanted))
    }

    pub fn resolve(&self, identifier: &str) -> CloseResult<PaymentMethod> {
        self.find(identifier)?
            .ok_or_else(|| CloseError::payment_method_not_found(identifier))
    }

    /// List methods in display order (cash first, card terminal second)
    pub fn list(&self, include_inactive: bool) -> CloseResult<Vec<PaymentMethod>> {
        if include_inactive {
            self.storage.payment_methods.get_all()
        } else {
            self.storage.payment_methods.get_active()
        }
    }

    pub fn update(&self, id: PaymentMethodId, changes: PaymentMethodUpdate) -> CloseResult<PaymentMethod> {
        let mut method = self
            .storage
            .payment_methods
            .get(id)?
            .ok_or_else(|| CloseError::payment_method_not_found(id.to_string()))?;
        let before = method.clone();

        if let Some(name) = changes.name {
            let name = name.trim();
            if self.storage.payment_methods.name_exists(name, Some(id))? {
                return Err(CloseError::Duplicate {
                    entity_type: "Payment method",
                    identifier: name.to_string(),
                });
            }
            method.name = name.to_string();
        }
        if let Some(is_cash) = changes.is_cash {
            method.is_cash = is_cash;
        }
        if let Some(active) = changes.active {
            method.active = active;
        }

        method.updated_at = chrono::Utc::now();
        method.validate().map_err(CloseError::Validation)?;

        self.storage.payment_methods.upsert(method.clone())?;
        self.storage.payment_methods.save()?;

        self.storage.log_update(
            EntityType::PaymentMethod,
            method.id.to_string(),
            Some(method.name.clone()),
            &before,
            &method,
        )?;

        info!(method = %method.name, "payment method updated");
        Ok(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ControlClosePaths;
    use crate::storage::initialize_storage;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ControlClosePaths::with_base_dir(temp_dir.path().to_path_buf());
        initialize_storage(&paths).unwrap();
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_defaults_and_create() {
        let (_temp_dir, storage) = create_test_storage();
        let service = PaymentMethodService::new(&storage);

        service.create("Satispay", false).unwrap();
        service.create("Buoni pasto", false).unwrap();

        let names: Vec<_> = service
            .list(false)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Contanti", "POS", "Buoni pasto", "Satispay"]);
        assert!(matches!(
            service.create("pos", false),
            Err(CloseError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_update_toggles() {
        let (_temp_dir, storage) = create_test_storage();
        let service = PaymentMethodService::new(&storage);
        let pos = service.resolve("POS").unwrap();

        let updated = service
            .update(
                pos.id,
                PaymentMethodUpdate {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.active);
        assert_eq!(service.list(false).unwrap().len(), 1);
        assert_eq!(service.list(true).unwrap().len(), 2);

        let err = service
            .update(
                pos.id,
                PaymentMethodUpdate {
                    name: Some(" ".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_find_by_short_id() {
        let (_temp_dir, storage) = create_test_storage();
        let service = PaymentMethodService::new(&storage);
        let pos = service.resolve("pos").unwrap();

        assert_eq!(service.resolve(&pos.id.to_string()).unwrap().id, pos.id);
    }
}
