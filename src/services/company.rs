//! Company settings service

use tracing::info;

use crate::audit::EntityType;
use crate::error::{CloseError, CloseResult};
use crate::models::CompanySettings;
use crate::storage::Storage;

pub struct CompanyService<'a> {
    storage: &'a Storage,
}

impl<'a> CompanyService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn get(&self) -> CloseResult<Option<CompanySettings>> {
        self.storage.company.get()
    }

    /// Create the settings row or update it, stamping `updated_at`
    ///
    /// `logo_url` of `None` keeps the current logo; `Some("")` removes it.
    pub fn upsert(&self, company_name: Option<&str>, logo_url: Option<&str>) -> CloseResult<CompanySettings> {
        let existing = self.storage.company.get()?;

        let mut settings = match &existing {
            Some(current) => current.clone(),
            None => CompanySettings::new(""),
        };

        if let Some(name) = company_name {
            settings.company_name = name.trim().to_string();
        }
        if let Some(logo) = logo_url {
            let logo = logo.trim();
            settings.logo_url = (!logo.is_empty()).then(|| logo.to_string());
        }

        if settings.company_name.is_empty() {
            return Err(CloseError::Validation("Company name cannot be empty".into()));
        }
        settings.updated_at = chrono::Utc::now();

        self.storage.company.set(settings.clone())?;
        self.storage.company.save()?;

        let id = "company";
        match existing {
            Some(before) => self.storage.log_update(
                EntityType::CompanySettings,
                id,
                Some(settings.company_name.clone()),
                &before,
                &settings,
            )?,
            None => self.storage.log_create(
                EntityType::CompanySettings,
                id,
                Some(settings.company_name.clone()),
                &settings,
            )?,
        }

        info!(company = %settings.company_name, "company settings saved");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::config::paths::ControlClosePaths;
    use tempfile::TempDir;

    #[test]
    fn test_upsert_creates_then_updates() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ControlClosePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        let service = CompanyService::new(&storage);

        assert!(service.upsert(None, Some("logo.png")).unwrap_err().is_validation());

        let first = service.upsert(Some("Forno Rossi"), Some("https://cdn/logo.png")).unwrap();
        let second = service.upsert(None, Some("")).unwrap();

        assert_eq!(second.company_name, "Forno Rossi");
        assert!(second.logo_url.is_none());
        assert!(second.updated_at >= first.updated_at);

        let ops: Vec<_> = storage
            .audit()
            .read_all()
            .unwrap()
            .into_iter()
            .map(|e| e.operation)
            .collect();
        assert_eq!(ops, vec![Operation::Create, Operation::Update]);
    }
}
