//! Cash close model
//!
//! One end-of-day reconciliation record for a store, together with the
//! payments by method and the cash expenses paid out of the drawer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CashCloseId, PaymentMethodId, StoreId};
use super::money::Money;

/// Largest absolute difference still classified as a warning (2.50)
pub const WARNING_THRESHOLD: Money = Money::from_cents(250);

/// Outcome of a close
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseStatus {
    /// Counted cash matches the theoretical fund exactly
    Ok,
    /// Small discrepancy, within the warning threshold
    Warning,
    /// Discrepancy above the warning threshold
    Ko,
}

impl CloseStatus {
    /// Classify a difference: zero is ok, up to 2.50 either way is a warning
    pub fn classify(difference: Money) -> Self {
        if difference.is_zero() {
            Self::Ok
        } else if difference.abs() <= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Ko
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ok" => Some(Self::Ok),
            "warning" | "warn" => Some(Self::Warning),
            "ko" => Some(Self::Ko),
            _ => None,
        }
    }

    /// Short label used in reports and notifications
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Ko => "KO",
        }
    }
}

impl fmt::Display for CloseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Warning => write!(f, "warning"),
            Self::Ko => write!(f, "ko"),
        }
    }
}

/// Amount taken with one payment method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashClosePayment {
    pub payment_method_id: PaymentMethodId,
    pub amount: Money,
}

/// Cash paid out of the drawer during the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashCloseExpense {
    pub description: String,
    pub amount: Money,
}

/// A submitted cash close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashClose {
    pub id: CashCloseId,
    pub store_id: StoreId,
    pub date: NaiveDate,
    pub compiler_name: String,

    #[serde(default)]
    pub notes: Option<String>,

    pub total_sales_amount: Money,
    pub bank_withdrawal_amount: Money,
    pub opening_cash_fund: Money,
    pub theoretical_cash_fund: Money,
    pub actual_cash_fund: Money,
    pub difference: Money,
    pub status: CloseStatus,

    /// Content path of the receipt photo in the receipt store
    #[serde(default)]
    pub receipt_image: Option<String>,

    #[serde(default)]
    pub payments: Vec<CashClosePayment>,

    #[serde(default)]
    pub expenses: Vec<CashCloseExpense>,

    pub created_at: DateTime<Utc>,
}

impl CashClose {
    pub fn payments_total(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn expenses_total(&self) -> Money {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// Amount recorded for one payment method (summing duplicate rows)
    pub fn payment_for(&self, method: PaymentMethodId) -> Money {
        self.payments
            .iter()
            .filter(|p| p.payment_method_id == method)
            .map(|p| p.amount)
            .sum()
    }

    /// Check that the stored derived fields agree with each other
    pub fn validate(&self) -> Result<(), String> {
        if self.compiler_name.trim().is_empty() {
            return Err("Compiler name cannot be empty".into());
        }

        if self.actual_cash_fund - self.theoretical_cash_fund != self.difference {
            return Err(format!(
                "Difference {} does not match actual {} minus theoretical {}",
                self.difference, self.actual_cash_fund, self.theoretical_cash_fund
            ));
        }

        if CloseStatus::classify(self.difference) != self.status {
            return Err(format!(
                "Status '{}' does not match difference {}",
                self.status, self.difference
            ));
        }

        if let Some(expense) = self.expenses.iter().find(|e| e.description.trim().is_empty()) {
            return Err(format!(
                "Expense of {} has no description",
                expense.amount
            ));
        }

        Ok(())
    }
}
