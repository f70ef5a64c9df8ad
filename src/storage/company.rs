//! Company settings repository (a single optional row)

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::CloseResult;
use crate::models::CompanySettings;

use super::file_io::{lock_error, read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CompanyData {
    #[serde(default)]
    company: Option<CompanySettings>,
}

pub struct CompanyRepository {
    path: PathBuf,
    data: RwLock<Option<CompanySettings>>,
}

impl CompanyRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(None),
        }
    }

    pub fn load(&self) -> CloseResult<()> {
        let file_data: CompanyData = read_json(&self.path)?;
        let mut data = self.data.write().map_err(lock_error)?;
        *data = file_data.company;
        Ok(())
    }

    pub fn save(&self) -> CloseResult<()> {
        let file_data = CompanyData {
            company: self.get()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self) -> CloseResult<Option<CompanySettings>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.clone())
    }

    pub fn set(&self, settings: CompanySettings) -> CloseResult<()> {
        let mut data = self.data.write().map_err(lock_error)?;
        *data = Some(settings);
        Ok(())
    }
}
