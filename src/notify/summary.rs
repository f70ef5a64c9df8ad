//! Rendering of the close summary sent to store recipients

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{CashClose, CloseStatus, Money, Store};

/// Figures included in a close notification
#[derive(Debug, Clone)]
pub struct CloseSummary {
    pub store_name: String,
    pub date: NaiveDate,
    pub compiler_name: String,
    pub total_sales: Money,
    pub actual_cash_fund: Money,
    pub theoretical_cash_fund: Money,
    pub bank_withdrawal: Money,
    pub status: CloseStatus,
    pub expenses: Vec<(String, Money)>,
    pub notes: Option<String>,
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl CloseSummary {
    pub fn from_close(close: &CashClose, store: &Store) -> Self {
        Self {
            store_name: store.name.clone(),
            date: close.date,
            compiler_name: close.compiler_name.clone(),
            total_sales: close.total_sales_amount,
            actual_cash_fund: close.actual_cash_fund,
            theoretical_cash_fund: close.theoretical_cash_fund,
            bank_withdrawal: close.bank_withdrawal_amount,
            status: close.status,
            expenses: close
                .expenses
                .iter()
                .map(|e| (e.description.clone(), e.amount))
                .collect(),
            notes: close.notes.clone(),
        }
    }

    fn status_text(&self) -> &'static str {
        match self.status {
            CloseStatus::Ok => "Balanced",
            CloseStatus::Warning => "Attention",
            CloseStatus::Ko => "Error",
        }
    }

    /// Plain-text body; the theoretical fund is shown only for unbalanced closes
    pub fn render_body(&self, currency: &str) -> String {
        let money = |m: Money| m.format_with_symbol(currency);
        let mut body = String::new();

        let _ = writeln!(body, "Cash close for {}", self.store_name);
        let _ = writeln!(body, "Status: {} ({})", self.status_text(), self.status.label());
        let _ = writeln!(body);
        let _ = writeln!(body, "Date:               {}", self.date.format("%Y-%m-%d"));
        let _ = writeln!(body, "Compiled by:        {}", self.compiler_name);
        let _ = writeln!(body, "Total sales:        {}", money(self.total_sales));
        let _ = writeln!(body, "Actual cash fund:   {}", money(self.actual_cash_fund));
        if self.status != CloseStatus::Ok {
            let _ = writeln!(body, "Theoretical fund:   {}", money(self.theoretical_cash_fund));
        }
        let _ = writeln!(body, "Bank withdrawal:    {}", money(self.bank_withdrawal));

        let _ = writeln!(body);
        let _ = writeln!(body, "Expenses:");
        if self.expenses.is_empty() {
            let _ = writeln!(body, "  none reported");
        }
        for (description, amount) in &self.expenses {
            let _ = writeln!(body, "  {}: {}", description, money(*amount));
        }

        let _ = writeln!(body);
        let _ = writeln!(
            body,
            "Notes: {}",
            self.notes.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or("none")
        );

        body
    }

    pub fn to_message(&self, recipients: Vec<String>, currency: &str) -> CloseMessage {
        CloseMessage {
            recipients,
            subject: format!(
                "[{}] Cash close {} {}",
                self.status.label(),
                self.store_name,
                self.date.format("%Y-%m-%d")
            ),
            body: self.render_body(currency),
        }
    }
}
