//! Profile service
//!
//! User administration: roles, blocking and per-operator store assignment.
//! Super admins are hidden from the regular user list.

use std::collections::BTreeSet;

use tracing::info;

use crate::audit::EntityType;
use crate::error::{CloseError, CloseResult};
use crate::models::{Profile, ProfileId, Role, Store, StoreId};
use crate::storage::Storage;

/// Partial update of a profile
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    /// `Some("")` clears the email
    pub email: Option<String>,
    pub role: Option<Role>,
    pub blocked: Option<bool>,
    /// Replaces the whole assignment set
    pub allowed_stores: Option<BTreeSet<StoreId>>,
}

pub struct ProfileService<'a> {
    storage: &'a Storage,
}

impl<'a> ProfileService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(
        &self,
        username: &str,
        role: Role,
        email: Option<&str>,
        allowed_stores: BTreeSet<StoreId>,
    ) -> CloseResult<Profile> {
        let username = username.trim();
        if self.storage.profiles.username_exists(username, None)? {
            return Err(CloseError::Duplicate {
                entity_type: "Profile",
                identifier: username.to_string(),
            });
        }
        self.check_stores_exist(&allowed_stores)?;

        let mut profile = Profile::new(username, role);
        profile.email = email.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string);
        profile.allowed_stores = allowed_stores;
        profile.validate().map_err(CloseError::Validation)?;

        self.storage.profiles.upsert(profile.clone())?;
        self.storage.profiles.save()?;

        self.storage.log_create(
            EntityType::Profile,
            profile.id.to_string(),
            Some(profile.username.clone()),
            &profile,
        )?;

        info!(user = %profile.username, role = %profile.role, "profile created");
        Ok(profile)
    }

    pub fn get(&self, id: ProfileId) -> CloseResult<Option<Profile>> {
        self.storage.profiles.get(id)
    }

    /// Find a profile by username, full id or short id
    pub fn find(&self, identifier: &str) -> CloseResult<Option<Profile>> {
        if let Some(profile) = self.storage.profiles.get_by_username(identifier)? {
            return Ok(Some(profile));
        }

        if let Ok(id) = identifier.parse::<ProfileId>() {
            return self.storage.profiles.get(id);
        }

        let wanted = identifier.trim();
        Ok(self
            .storage
            .profiles
            .get_all()?
            .into_iter()
            .find(|p| p.id.to_string() == wanted))
    }

    pub fn resolve(&self, identifier: &str) -> CloseResult<Profile> {
        self.find(identifier)?
            .ok_or_else(|| CloseError::profile_not_found(identifier))
    }

    /// Users shown in the administration list (super admins excluded)
    pub fn list(&self) -> CloseResult<Vec<Profile>> {
        Ok(self
            .storage
            .profiles
            .get_all()?
            .into_iter()
            .filter(|p| p.role != Role::SuperAdmin)
            .collect())
    }

    pub fn update(&self, id: ProfileId, changes: ProfileUpdate) -> CloseResult<Profile> {
        let mut profile = self
            .storage
            .profiles
            .get(id)?
            .ok_or_else(|| CloseError::profile_not_found(id.to_string()))?;
        let before = profile.clone();

        if let Some(username) = changes.username {
            let username = username.trim();
            if self.storage.profiles.username_exists(username, Some(id))? {
                return Err(CloseError::Duplicate {
                    entity_type: "Profile",
                    identifier: username.to_string(),
                });
            }
            profile.username = username.to_string();
        }
        if let Some(email) = changes.email {
            let email = email.trim();
            profile.email = (!email.is_empty()).then(|| email.to_string());
        }
        if let Some(role) = changes.role {
            profile.role = role;
        }
        if let Some(blocked) = changes.blocked {
            profile.blocked = blocked;
        }
        if let Some(stores) = changes.allowed_stores {
            self.check_stores_exist(&stores)?;
            profile.allowed_stores = stores;
        }

        profile.validate().map_err(CloseError::Validation)?;
        self.persist_update(&before, &profile)?;

        info!(user = %profile.username, "profile updated");
        Ok(profile)
    }

    /// Set (or clear) the store preselected in the close wizard
    pub fn set_default_store(&self, id: ProfileId, store_id: Option<StoreId>) -> CloseResult<Profile> {
        let mut profile = self
            .storage
            .profiles
            .get(id)?
            .ok_or_else(|| CloseError::profile_not_found(id.to_string()))?;
        let before = profile.clone();

        if let Some(store_id) = store_id {
            if self.storage.stores.get(store_id)?.is_none() {
                return Err(CloseError::store_not_found(store_id.to_string()));
            }
            if !profile.can_use_store(store_id) {
                return Err(CloseError::Unauthorized(format!(
                    "{} is not assigned to store {}",
                    profile.username, store_id
                )));
            }
        }

        profile.default_store_id = store_id;
        self.persist_update(&before, &profile)?;
        Ok(profile)
    }

    /// Mark the profile's email as confirmed
    pub fn confirm_email(&self, id: ProfileId) -> CloseResult<Profile> {
        let mut profile = self
            .storage
            .profiles
            .get(id)?
            .ok_or_else(|| CloseError::profile_not_found(id.to_string()))?;
        let before = profile.clone();

        if profile.email_confirmed_at.is_none() {
            profile.email_confirmed_at = Some(chrono::Utc::now());
            self.persist_update(&before, &profile)?;
        }
        Ok(profile)
    }

    pub fn delete(&self, id: ProfileId) -> CloseResult<()> {
        let profile = self
            .storage
            .profiles
            .get(id)?
            .ok_or_else(|| CloseError::profile_not_found(id.to_string()))?;

        self.storage.profiles.delete(id)?;
        self.storage.profiles.save()?;

        self.storage.log_delete(
            EntityType::Profile,
            profile.id.to_string(),
            Some(profile.username.clone()),
            &profile,
        )?;

        info!(user = %profile.username, "profile deleted");
        Ok(())
    }

    /// Active stores the profile may see: all for admins, assigned ones for operators
    pub fn available_stores(&self, profile: &Profile) -> CloseResult<Vec<Store>> {
        Ok(self
            .storage
            .stores
            .get_active()?
            .into_iter()
            .filter(|s| profile.can_use_store(s.id))
            .collect())
    }

    fn persist_update(&self, before: &Profile, after: &Profile) -> CloseResult<()> {
        self.storage.profiles.upsert(after.clone())?;
        self.storage.profiles.save()?;
        self.storage.log_update(
            EntityType::Profile,
            after.id.to_string(),
            Some(after.username.clone()),
            before,
            after,
        )
    }

    fn check_stores_exist(&self, stores: &BTreeSet<StoreId>) -> CloseResult<()> {
        for store_id in stores {
            if self.storage.stores.get(*store_id)?.is_none() {
                return Err(CloseError::store_not_found(store_id.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ControlClosePaths;
    use crate::models::Money;
    use crate::services::StoreService;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ControlClosePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_list_hides_super_admin() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ProfileService::new(&storage);

        service.create("root", Role::SuperAdmin, None, BTreeSet::new()).unwrap();
        service.create("anna", Role::Admin, None, BTreeSet::new()).unwrap();
        service.create("mario", Role::Operator, None, BTreeSet::new()).unwrap();

        let names: Vec<_> = service.list().unwrap().into_iter().map(|p| p.username).collect();
        assert_eq!(names, vec!["anna", "mario"]);
        assert!(service.find("root").unwrap().is_some());
    }

    #[test]
    fn test_username_length_on_update() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ProfileService::new(&storage);
        let mario = service.create("mario", Role::Operator, None, BTreeSet::new()).unwrap();

        let err = service
            .update(
                mario.id,
                ProfileUpdate {
                    username: Some("mo".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(service.get(mario.id).unwrap().unwrap().username, "mario");
    }

    #[test]
    fn test_allowed_stores_replaced_wholesale() {
        let (_temp_dir, storage) = create_test_storage();
        let stores = StoreService::new(&storage);
        let centro = stores.create("Centro", Money::zero(), None).unwrap();
        let stazione = stores.create("Stazione", Money::zero(), None).unwrap();
        let service = ProfileService::new(&storage);

        let mario = service
            .create("mario", Role::Operator, None, BTreeSet::from([centro.id]))
            .unwrap();
        assert_eq!(service.available_stores(&mario).unwrap().len(), 1);

        let mario = service
            .update(
                mario.id,
                ProfileUpdate {
                    allowed_stores: Some(BTreeSet::from([stazione.id])),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(mario.allowed_stores, BTreeSet::from([stazione.id]));

        let unknown = service.update(
            mario.id,
            ProfileUpdate {
                allowed_stores: Some(BTreeSet::from([StoreId::new()])),
                ..Default::default()
            },
        );
        assert!(unknown.unwrap_err().is_not_found());
    }

    #[test]
    fn test_admin_sees_all_active_stores() {
        let (_temp_dir, storage) = create_test_storage();
        let stores = StoreService::new(&storage);
        stores.create("Centro", Money::zero(), None).unwrap();
        let closed = stores.create("Vecchio", Money::zero(), None).unwrap();
        stores.set_active(closed.id, false).unwrap();
        let service = ProfileService::new(&storage);

        let anna = service.create("anna", Role::Admin, None, BTreeSet::new()).unwrap();
        let names: Vec<_> = service
            .available_stores(&anna)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Centro"]);
    }

    #[test]
    fn test_default_store_must_be_assigned() {
        let (_temp_dir, storage) = create_test_storage();
        let stores = StoreService::new(&storage);
        let centro = stores.create("Centro", Money::zero(), None).unwrap();
        let stazione = stores.create("Stazione", Money::zero(), None).unwrap();
        let service = ProfileService::new(&storage);
        let mario = service
            .create("mario", Role::Operator, None, BTreeSet::from([centro.id]))
            .unwrap();

        let updated = service.set_default_store(mario.id, Some(centro.id)).unwrap();
        assert_eq!(updated.default_store_id, Some(centro.id));

        assert!(matches!(
            service.set_default_store(mario.id, Some(stazione.id)),
            Err(CloseError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_delete_and_confirm() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ProfileService::new(&storage);
        let mario = service
            .create("mario", Role::Operator, Some("mario@shop.it"), BTreeSet::new())
            .unwrap();

        assert!(service.confirm_email(mario.id).unwrap().is_confirmed());
        service.delete(mario.id).unwrap();
        assert!(service.get(mario.id).unwrap().is_none());
        assert!(service.delete(mario.id).unwrap_err().is_not_found());
    }
}
