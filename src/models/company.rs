//! Company settings model (singleton)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySettings {
    pub company_name: String,

    #[serde(default)]
    pub logo_url: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl CompanySettings {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            logo_url: None,
            updated_at: Utc::now(),
        }
    }
}
