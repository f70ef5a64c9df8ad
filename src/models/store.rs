//! Store model
//!
//! A physical shop whose cash register is closed every day.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::StoreId;
use super::money::Money;

/// A retail store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,

    /// Display name, unique across stores (case-insensitive)
    pub name: String,

    /// Inactive stores keep their history but take no new closes
    pub active: bool,

    /// Comma-separated recipients for close summaries
    #[serde(default)]
    pub email_destinations: Option<String>,

    /// Cash fund used when the store has no earlier close
    pub opening_cash_fund: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn new(name: impl Into<String>, opening_cash_fund: Money) -> Self {
        let now = Utc::now();
        Self {
            id: StoreId::new(),
            name: name.into(),
            active: true,
            email_destinations: None,
            opening_cash_fund,
            created_at: now,
            updated_at: now,
        }
    }

    /// Individual notification recipients, trimmed and without blanks
    pub fn recipients(&self) -> Vec<String> {
        self.email_destinations
            .as_deref()
            .unwrap_or_default()
            .split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), StoreValidationError> {
        if self.name.trim().is_empty() {
            return Err(StoreValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(StoreValidationError::NameTooLong(self.name.len()));
        }

        if self.opening_cash_fund.is_negative() {
            return Err(StoreValidationError::NegativeOpeningFund(
                self.opening_cash_fund,
            ));
        }

        for recipient in self.recipients() {
            if !recipient.contains('@') {
                return Err(StoreValidationError::InvalidEmail(recipient));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativeOpeningFund(Money),
    InvalidEmail(String),
}

impl fmt::Display for StoreValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Store name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Store name too long ({} chars, max 100)", len)
            }
            Self::NegativeOpeningFund(amount) => {
                write!(f, "Opening cash fund cannot be negative: {}", amount)
            }
            Self::InvalidEmail(email) => write!(f, "Invalid email destination: {}", email),
        }
    }
}

impl std::error::Error for StoreValidationError {}
