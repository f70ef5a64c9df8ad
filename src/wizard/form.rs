//! The shared form record behind every wizard step
//!
//! Amounts are kept as the text the operator typed so that a blank field
//! can be told apart from an explicit zero. Turning text into `Money` goes
//! through the configured `InputPolicy`.

use chrono::NaiveDate;

use crate::config::settings::InputPolicy;
use crate::error::{CloseError, CloseResult};
use crate::models::{
    CashCloseExpense, CashClosePayment, Money, MoneyParseError, PaymentMethod, PaymentMethodId,
    StoreId,
};
use crate::services::ReceiptAttachment;

/// One input row per active payment method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRow {
    pub method_id: PaymentMethodId,
    pub method_name: String,
    pub is_cash: bool,
    pub amount: String,
}

impl PaymentRow {
    pub fn for_method(method: &PaymentMethod) -> Self {
        Self {
            method_id: method.id,
            method_name: method.name.clone(),
            is_cash: method.is_cash,
            amount: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseRow {
    pub description: String,
    pub amount: String,
}

#[derive(Debug, Clone, Default)]
pub struct CloseForm {
    pub store_id: Option<StoreId>,
    pub date: Option<NaiveDate>,
    pub compiler_name: String,
    pub notes: String,
    pub receipt: Option<ReceiptAttachment>,
    pub total_sales: String,
    pub payments: Vec<PaymentRow>,
    pub expenses: Vec<ExpenseRow>,
    pub bank_withdrawal: String,
    /// Looked up from the previous close, never typed
    pub opening_cash_fund: Money,
    pub actual_cash_fund: String,
}

/// Read an amount field for display: extra decimals round to the cent,
/// anything unreadable counts as zero
pub fn lenient_amount(raw: &str) -> Money {
    Money::parse_rounded(raw).unwrap_or_default()
}

/// Read an amount field for submission
///
/// Under `Coerce`, extra decimals round to the cent and blank or unreadable
/// text counts as zero. Under `Reject`, unreadable or over-precise text is an
/// error and so is a blank `required` field. Out-of-range amounts are always
/// rejected.
pub fn policy_amount(label: &str, raw: &str, policy: InputPolicy, required: bool) -> CloseResult<Money> {
    match policy {
        InputPolicy::Coerce => match Money::parse_rounded(raw) {
            Ok(amount) => Ok(amount),
            Err(e @ MoneyParseError::TooLarge(_)) => {
                Err(CloseError::Validation(format!("{}: {}", label, e)))
            }
            Err(_) => Ok(Money::zero()),
        },
        InputPolicy::Reject => match Money::parse_optional(raw) {
            Ok(Some(amount)) => Ok(amount),
            Ok(None) if required => Err(CloseError::Validation(format!("{} is required", label))),
            Ok(None) => Ok(Money::zero()),
            Err(e) => Err(CloseError::Validation(format!("{}: {}", label, e))),
        },
    }
}

impl CloseForm {
    /// Payment rows with an amount, read leniently
    pub fn lenient_payments(&self) -> Vec<CashClosePayment> {
        self.payments
            .iter()
            .filter(|row| !row.amount.trim().is_empty())
            .map(|row| CashClosePayment {
                payment_method_id: row.method_id,
                amount: lenient_amount(&row.amount),
            })
            .collect()
    }

    /// Expense rows with an amount, read leniently
    pub fn lenient_expenses(&self) -> Vec<CashCloseExpense> {
        self.expenses
            .iter()
            .filter(|row| !row.amount.trim().is_empty())
            .map(|row| CashCloseExpense {
                description: row.description.trim().to_string(),
                amount: lenient_amount(&row.amount),
            })
            .collect()
    }

    /// Payment rows ready to store; blank rows are dropped
    pub fn submitted_payments(&self, policy: InputPolicy) -> CloseResult<Vec<CashClosePayment>> {
        self.payments
            .iter()
            .filter(|row| !row.amount.trim().is_empty())
            .map(|row| {
                Ok(CashClosePayment {
                    payment_method_id: row.method_id,
                    amount: policy_amount(&row.method_name, &row.amount, policy, false)?,
                })
            })
            .collect()
    }

    /// Expense rows ready to store; rows without an amount are dropped
    pub fn submitted_expenses(&self, policy: InputPolicy) -> CloseResult<Vec<CashCloseExpense>> {
        self.expenses
            .iter()
            .filter(|row| !row.amount.trim().is_empty())
            .map(|row| {
                let description = row.description.trim().to_string();
                if description.is_empty() {
                    return Err(CloseError::Validation(format!(
                        "Expense of {} needs a description",
                        row.amount.trim()
                    )));
                }
                Ok(CashCloseExpense {
                    amount: policy_amount(&description, &row.amount, policy, false)?,
                    description,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_amount() {
        assert_eq!(
            policy_amount("Sales", "", InputPolicy::Coerce, true).unwrap(),
            Money::zero()
        );
        assert_eq!(
            policy_amount("Sales", "abc", InputPolicy::Coerce, true).unwrap(),
            Money::zero()
        );
        assert_eq!(
            policy_amount("Sales", "12,50", InputPolicy::Reject, true).unwrap(),
            Money::from_cents(1250)
        );
        assert!(policy_amount("Sales", " ", InputPolicy::Reject, true)
            .unwrap_err()
            .is_validation());
        assert!(policy_amount("Sales", "1.234", InputPolicy::Reject, false)
            .unwrap_err()
            .is_validation());
        assert_eq!(
            policy_amount("Withdrawal", "", InputPolicy::Reject, false).unwrap(),
            Money::zero()
        );
    }

    #[test]
    fn test_extra_decimals_round_under_coerce() {
        assert_eq!(
            policy_amount("Cash count", "94.005", InputPolicy::Coerce, true).unwrap(),
            Money::from_cents(9401)
        );
        assert_eq!(lenient_amount("94,004"), Money::from_cents(9400));
        assert!(policy_amount("Cash count", "94.005", InputPolicy::Reject, true)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_out_of_range_amount_is_never_coerced() {
        for policy in [InputPolicy::Coerce, InputPolicy::Reject] {
            assert!(policy_amount("Sales", "92233720368547758", policy, true)
                .unwrap_err()
                .is_validation());
        }
    }

    #[test]
    fn test_blank_rows_dropped() {
        let cash = PaymentMethod::new("Contanti", true);
        let pos = PaymentMethod::new("POS", false);
        let mut cash_row = PaymentRow::for_method(&cash);
        cash_row.amount = "10".into();
        let form = CloseForm {
            payments: vec![cash_row, PaymentRow::for_method(&pos)],
            expenses: vec![
                ExpenseRow {
                    description: "milk".into(),
                    amount: "2".into(),
                },
                ExpenseRow {
                    description: "forgotten".into(),
                    amount: "".into(),
                },
            ],
            ..Default::default()
        };

        let payments = form.submitted_payments(InputPolicy::Reject).unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].payment_method_id, cash.id);

        let expenses = form.submitted_expenses(InputPolicy::Coerce).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].amount, Money::from_cents(200));
    }

    #[test]
    fn test_expense_without_description() {
        let form = CloseForm {
            expenses: vec![ExpenseRow {
                description: " ".into(),
                amount: "3".into(),
            }],
            ..Default::default()
        };
        assert!(form
            .submitted_expenses(InputPolicy::Coerce)
            .unwrap_err()
            .is_validation());
    }
}
