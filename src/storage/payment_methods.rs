//! Payment method repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::CloseResult;
use crate::models::{PaymentMethod, PaymentMethodId};

use super::file_io::{lock_error, read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct PaymentMethodData {
    pub payment_methods: Vec<PaymentMethod>,
}

/// Repository for payment method persistence
pub struct PaymentMethodRepository {
    path: PathBuf,
    data: RwLock<HashMap<PaymentMethodId, PaymentMethod>>,
}

impl PaymentMethodRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> CloseResult<()> {
        let file_data: PaymentMethodData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_error)?;
        data.clear();
        for method in file_data.payment_methods {
            data.insert(method.id, method);
        }

        Ok(())
    }

    pub fn save(&self) -> CloseResult<()> {
        let file_data = PaymentMethodData {
            payment_methods: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: PaymentMethodId) -> CloseResult<Option<PaymentMethod>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// Get all payment methods in display order
    pub fn get_all(&self) -> CloseResult<Vec<PaymentMethod>> {
        let data = self.data.read().map_err(lock_error)?;

        let mut methods: Vec<_> = data.values().cloned().collect();
        methods.sort_by(PaymentMethod::display_order);
        Ok(methods)
    }

    /// Get the active payment methods in display order
    pub fn get_active(&self) -> CloseResult<Vec<PaymentMethod>> {
        Ok(self.get_all()?.into_iter().filter(|m| m.active).collect())
    }

    pub fn get_by_name(&self, name: &str) -> CloseResult<Option<PaymentMethod>> {
        let data = self.data.read().map_err(lock_error)?;

        let name_lower = name.trim().to_lowercase();
        Ok(data
            .values()
            .find(|m| m.name.to_lowercase() == name_lower)
            .cloned())
    }

    pub fn upsert(&self, method: PaymentMethod) -> CloseResult<()> {
        let mut data = self.data.write().map_err(lock_error)?;
        data.insert(method.id, method);
        Ok(())
    }

    pub fn name_exists(&self, name: &str, exclude_id: Option<PaymentMethodId>) -> CloseResult<bool> {
        let data = self.data.read().map_err(lock_error)?;

        let name_lower = name.trim().to_lowercase();
        Ok(data
            .values()
            .any(|m| m.name.to_lowercase() == name_lower && Some(m.id) != exclude_id))
    }

    pub fn count(&self) -> CloseResult<usize> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.len())
    }
}
