//! Store repository for JSON storage
//!
//! Manages loading and saving stores to stores.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::CloseResult;
use crate::models::{Store, StoreId};

use super::file_io::{lock_error, read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct StoreData {
    stores: Vec<Store>,
}

/// Repository for store persistence
pub struct StoreRepository {
    path: PathBuf,
    data: RwLock<HashMap<StoreId, Store>>,
}

impl StoreRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load stores from disk
    pub fn load(&self) -> CloseResult<()> {
        let file_data: StoreData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_error)?;
        data.clear();
        for store in file_data.stores {
            data.insert(store.id, store);
        }

        Ok(())
    }

    /// Save stores to disk
    pub fn save(&self) -> CloseResult<()> {
        let data = self.data.read().map_err(lock_error)?;

        let mut stores: Vec<_> = data.values().cloned().collect();
        stores.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &StoreData { stores })
    }

    pub fn get(&self, id: StoreId) -> CloseResult<Option<Store>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// Get all stores, sorted by name
    pub fn get_all(&self) -> CloseResult<Vec<Store>> {
        let data = self.data.read().map_err(lock_error)?;

        let mut stores: Vec<_> = data.values().cloned().collect();
        stores.sort_by_key(|s| s.name.to_lowercase());
        Ok(stores)
    }

    pub fn get_active(&self) -> CloseResult<Vec<Store>> {
        Ok(self.get_all()?.into_iter().filter(|s| s.active).collect())
    }

    /// Get a store by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> CloseResult<Option<Store>> {
        let data = self.data.read().map_err(lock_error)?;

        let name_lower = name.trim().to_lowercase();
        Ok(data
            .values()
            .find(|s| s.name.to_lowercase() == name_lower)
            .cloned())
    }

    pub fn upsert(&self, store: Store) -> CloseResult<()> {
        let mut data = self.data.write().map_err(lock_error)?;
        data.insert(store.id, store);
        Ok(())
    }

    pub fn delete(&self, id: StoreId) -> CloseResult<bool> {
        let mut data = self.data.write().map_err(lock_error)?;
        Ok(data.remove(&id).is_some())
    }

    /// Check if a store name is already taken
    pub fn name_exists(&self, name: &str, exclude_id: Option<StoreId>) -> CloseResult<bool> {
        let data = self.data.read().map_err(lock_error)?;

        let name_lower = name.trim().to_lowercase();
        Ok(data
            .values()
            .any(|s| s.name.to_lowercase() == name_lower && Some(s.id) != exclude_id))
    }

    pub fn count(&self) -> CloseResult<usize> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.len())
    }
}
