//! Profile repository for JSON storage
//!
//! Store assignments live on the profile itself (`allowed_stores`), so the
//! profile/store join is persisted in the same file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::CloseResult;
use crate::models::{Profile, ProfileId, StoreId};

use super::file_io::{lock_error, read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ProfileData {
    profiles: Vec<Profile>,
}

/// Repository for user profile persistence
pub struct ProfileRepository {
    path: PathBuf,
    data: RwLock<HashMap<ProfileId, Profile>>,
}

impl ProfileRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> CloseResult<()> {
        let file_data: ProfileData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_error)?;
        data.clear();
        for profile in file_data.profiles {
            data.insert(profile.id, profile);
        }

        Ok(())
    }

    pub fn save(&self) -> CloseResult<()> {
        let file_data = ProfileData {
            profiles: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: ProfileId) -> CloseResult<Option<Profile>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// Get all profiles, sorted by username
    pub fn get_all(&self) -> CloseResult<Vec<Profile>> {
        let data = self.data.read().map_err(lock_error)?;

        let mut profiles: Vec<_> = data.values().cloned().collect();
        profiles.sort_by_key(|p| p.username.to_lowercase());
        Ok(profiles)
    }

    pub fn get_by_username(&self, username: &str) -> CloseResult<Option<Profile>> {
        let data = self.data.read().map_err(lock_error)?;

        let wanted = username.trim().to_lowercase();
        Ok(data
            .values()
            .find(|p| p.username.to_lowercase() == wanted)
            .cloned())
    }

    /// Profiles explicitly assigned to a store
    pub fn get_by_store(&self, store_id: StoreId) -> CloseResult<Vec<Profile>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|p| p.allowed_stores.contains(&store_id))
            .collect())
    }

    pub fn upsert(&self, profile: Profile) -> CloseResult<()> {
        let mut data = self.data.write().map_err(lock_error)?;
        data.insert(profile.id, profile);
        Ok(())
    }

    pub fn delete(&self, id: ProfileId) -> CloseResult<bool> {
        let mut data = self.data.write().map_err(lock_error)?;
        Ok(data.remove(&id).is_some())
    }

    pub fn username_exists(&self, username: &str, exclude_id: Option<ProfileId>) -> CloseResult<bool> {
        let data = self.data.read().map_err(lock_error)?;

        let wanted = username.trim().to_lowercase();
        Ok(data
            .values()
            .any(|p| p.username.to_lowercase() == wanted && Some(p.id) != exclude_id))
    }

    pub fn count(&self) -> CloseResult<usize> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.len())
    }
}
