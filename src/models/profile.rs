//! User profile model
//!
//! Profiles carry the role that governs route access and the set of stores
//! an operator may close.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::ids::{ProfileId, StoreId};

/// Role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Store operator: fills in closes for assigned stores
    #[default]
    #[serde(rename = "operatore", alias = "operator")]
    Operator,
    /// Administrator: reviews closes and manages master data
    #[serde(rename = "admin")]
    Admin,
    /// Administrator who may also act as an operator
    #[serde(rename = "superAdmin", alias = "superadmin")]
    SuperAdmin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "operatore" | "operator" => Some(Self::Operator),
            "admin" => Some(Self::Admin),
            "superadmin" | "super_admin" | "super-admin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator => write!(f, "operatore"),
            Self::Admin => write!(f, "admin"),
            Self::SuperAdmin => write!(f, "superAdmin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub username: String,

    #[serde(default)]
    pub email: Option<String>,

    pub role: Role,

    #[serde(default)]
    pub blocked: bool,

    #[serde(default)]
    pub default_store_id: Option<StoreId>,

    /// Stores this user may close (ignored for admins, who see every store)
    #[serde(default)]
    pub allowed_stores: BTreeSet<StoreId>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            id: ProfileId::new(),
            username: username.into(),
            email: None,
            role,
            blocked: false,
            default_store_id: None,
            allowed_stores: BTreeSet::new(),
            created_at: Utc::now(),
            email_confirmed_at: None,
        }
    }

    /// Whether this profile may see and close the given store
    pub fn can_use_store(&self, store: StoreId) -> bool {
        self.role.is_admin() || self.allowed_stores.contains(&store)
    }

    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().chars().count() < 3 {
            return Err("Username must be at least 3 characters".into());
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(format!("Invalid email: {}", email));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Operator).unwrap(), "\"operatore\"");
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"superAdmin\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Operatore"), Some(Role::Operator));
        assert_eq!(Role::parse("superAdmin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn test_store_visibility() {
        let store = StoreId::new();
        let other = StoreId::new();

        let mut operator = Profile::new("mario", Role::Operator);
        operator.allowed_stores.insert(store);
        assert!(operator.can_use_store(store));
        assert!(!operator.can_use_store(other));

        let admin = Profile::new("anna", Role::Admin);
        assert!(admin.can_use_store(other));
    }

    #[test]
    fn test_validate_username_length() {
        assert!(Profile::new("al", Role::Operator).validate().is_err());
        assert!(Profile::new("ale", Role::Operator).validate().is_ok());
    }
}
