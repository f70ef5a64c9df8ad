//! Payment method model
//!
//! The `is_cash` flag splits payments into money that stays in the drawer
//! and money settled elsewhere (card terminals, wallets). Only the latter is
//! subtracted when computing the theoretical cash fund.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::ids::PaymentMethodId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    pub is_cash: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn new(name: impl Into<String>, is_cash: bool) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentMethodId::new(),
            name: name.into(),
            is_cash,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Payment method name cannot be empty".into());
        }
        if name.len() > 50 {
            return Err(format!(
                "Payment method name too long ({} chars, max 50)",
                name.len()
            ));
        }
        Ok(())
    }

    /// Display rank: the cash method first, the card terminal second, the rest after
    fn rank(&self) -> u8 {
        match self.name.trim().to_lowercase().as_str() {
            "contanti" | "cash" => 0,
            "pos" => 1,
            _ => 2,
        }
    }

    /// Ordering used by the close form and the admin list
    pub fn display_order(a: &PaymentMethod, b: &PaymentMethod) -> Ordering {
        a.rank()
            .cmp(&b.rank())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_cash {
            write!(f, "{} (cash)", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}
