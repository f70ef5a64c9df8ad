//! Reconciliation calculator
//!
//! Maps the raw figures of a cash close to the theoretical cash fund, the
//! difference against the counted cash and the resulting status. The
//! calculation is total: it never fails, and every derived field a close
//! stores comes from here.

use std::collections::HashMap;

use crate::models::{
    CashCloseExpense, CashClosePayment, CloseStatus, Money, PaymentMethod, PaymentMethodId,
};

/// Label for payments whose method is missing from the catalog
pub const UNKNOWN_METHOD_LABEL: &str = "Other";

/// Largest tolerated gap between the payments total and declared sales
pub const PAYMENTS_TOLERANCE: Money = Money::from_cents(1);

/// Raw figures of a close
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationInput<'a> {
    pub opening: Money,
    pub sales: Money,
    pub withdrawal: Money,
    pub payments: &'a [CashClosePayment],
    pub expenses: &'a [CashCloseExpense],
    pub actual: Money,
}

/// Non-cash amount taken with one payment method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonCashLine {
    pub method_id: PaymentMethodId,
    pub name: String,
    pub amount: Money,
}

/// Deviation worth a note from the compiler; never changes the status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationWarning {
    /// Payments by method do not add up to the declared sales
    PaymentsMismatch {
        payments_total: Money,
        sales: Money,
        delta: Money,
    },
}

impl std::fmt::Display for ReconciliationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PaymentsMismatch {
                payments_total,
                sales,
                delta,
            } => write!(
                f,
                "Payments total {} differs from declared sales {} by {}; add a note explaining why",
                payments_total,
                sales,
                delta.format_signed()
            ),
        }
    }
}

/// Derived figures of a close
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Opening fund plus sales
    pub partial_result: Money,
    pub non_cash_total: Money,
    pub cash_total: Money,
    pub payments_total: Money,
    pub expenses_total: Money,
    pub theoretical: Money,
    pub difference: Money,
    pub status: CloseStatus,
    /// Non-cash amounts per method, in the order the methods first appear
    pub non_cash_breakdown: Vec<NonCashLine>,
    pub warnings: Vec<ReconciliationWarning>,
}

impl Reconciliation {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Compute the derived figures of a close against a payment-method catalog
pub fn reconcile(input: &ReconciliationInput<'_>, methods: &[PaymentMethod]) -> Reconciliation {
    let catalog: HashMap<PaymentMethodId, &PaymentMethod> =
        methods.iter().map(|m| (m.id, m)).collect();

    let mut non_cash_breakdown: Vec<NonCashLine> = Vec::new();
    let mut cash_total = Money::zero();
    let mut payments_total = Money::zero();

    for payment in input.payments {
        payments_total += payment.amount;

        let method = catalog.get(&payment.payment_method_id);
        if method.is_some_and(|m| m.is_cash) {
            cash_total += payment.amount;
            continue;
        }

        if !payment.amount.is_positive() {
            continue;
        }

        match non_cash_breakdown
            .iter_mut()
            .find(|line| line.method_id == payment.payment_method_id)
        {
            Some(line) => line.amount += payment.amount,
            None => non_cash_breakdown.push(NonCashLine {
                method_id: payment.payment_method_id,
                name: method
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|| UNKNOWN_METHOD_LABEL.to_string()),
                amount: payment.amount,
            }),
        }
    }

    let non_cash_total: Money = non_cash_breakdown.iter().map(|l| l.amount).sum();
    let expenses_total: Money = input.expenses.iter().map(|e| e.amount).sum();

    let partial_result = input.opening + input.sales;
    let theoretical = partial_result - input.withdrawal - non_cash_total - expenses_total;
    let difference = input.actual - theoretical;
    let status = CloseStatus::classify(difference);

    let mut warnings = Vec::new();
    let delta = payments_total - input.sales;
    if delta.abs() > PAYMENTS_TOLERANCE {
        warnings.push(ReconciliationWarning::PaymentsMismatch {
            payments_total,
            sales: input.sales,
            delta,
        });
    }

    Reconciliation {
        partial_result,
        non_cash_total,
        cash_total,
        payments_total,
        expenses_total,
        theoretical,
        difference,
        status,
        non_cash_breakdown,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    fn catalog() -> (PaymentMethod, PaymentMethod) {
        (
            PaymentMethod::new("Contanti", true),
            PaymentMethod::new("POS", false),
        )
    }

    fn pay(method: &PaymentMethod, cents: i64) -> CashClosePayment {
        CashClosePayment {
            payment_method_id: method.id,
            amount: m(cents),
        }
    }

    fn expense(description: &str, cents: i64) -> CashCloseExpense {
        CashCloseExpense {
            description: description.into(),
            amount: m(cents),
        }
    }

    #[test]
    fn test_extreme_amounts_do_not_panic() {
        let input = ReconciliationInput {
            opening: Money::parse("1").unwrap(),
            sales: m(i64::MAX),
            withdrawal: m(i64::MIN),
            payments: &[],
            expenses: &[],
            actual: m(i64::MIN),
        };
        let result = reconcile(&input, &[]);
        assert_eq!(result.theoretical, m(i64::MAX));
        assert_eq!(result.status, CloseStatus::Ko);
    }

    #[test]
    fn test_reference_scenario() {
        let (cash, card) = catalog();
        let payments = vec![pay(&cash, 10000), pay(&card, 10000)];
        let expenses = vec![expense("coffee", 500)];
        let input = ReconciliationInput {
            opening: m(5000),
            sales: m(20000),
            withdrawal: m(5000),
            payments: &payments,
            expenses: &expenses,
            actual: m(9400),
        };

        let result = reconcile(&input, &[cash, card]);

        assert_eq!(result.non_cash_total, m(10000));
        assert_eq!(result.cash_total, m(10000));
        assert_eq!(result.partial_result, m(25000));
        assert_eq!(result.theoretical, m(9500));
        assert_eq!(result.difference, m(-100));
        assert_eq!(result.status, CloseStatus::Warning);
        assert!(!result.has_warnings());
        assert_eq!(result.non_cash_breakdown.len(), 1);
        assert_eq!(result.non_cash_breakdown[0].name, "POS");
    }

    #[test]
    fn test_status_tiers() {
        let input = |actual: Money| ReconciliationInput {
            opening: m(10000),
            sales: Money::zero(),
            withdrawal: Money::zero(),
            payments: &[],
            expenses: &[],
            actual,
        };

        assert_eq!(reconcile(&input(m(10000)), &[]).status, CloseStatus::Ok);
        assert_eq!(reconcile(&input(m(10250)), &[]).status, CloseStatus::Warning);
        assert_eq!(reconcile(&input(m(9750)), &[]).status, CloseStatus::Warning);
        assert_eq!(reconcile(&input(m(10251)), &[]).status, CloseStatus::Ko);
        assert_eq!(reconcile(&input(m(9749)), &[]).status, CloseStatus::Ko);
    }

    #[test]
    fn test_theoretical_identity_over_grid() {
        let (cash, card) = catalog();
        for opening in [0, 5000, 12345] {
            for sales in [0, 20000, 99999] {
                for withdrawal in [0, 3000] {
                    for cash_part in [0, 7000] {
                        for card_part in [0, 4550] {
                            let payments = vec![pay(&cash, cash_part), pay(&card, card_part)];
                            let expenses = vec![expense("a", 150), expense("b", 275)];
                            let input = ReconciliationInput {
                                opening: m(opening),
                                sales: m(sales),
                                withdrawal: m(withdrawal),
                                payments: &payments,
                                expenses: &expenses,
                                actual: m(1000),
                            };
                            let r = reconcile(&input, &[cash.clone(), card.clone()]);
                            assert_eq!(
                                r.theoretical,
                                m(opening + sales - withdrawal - card_part - 425)
                            );
                            assert_eq!(r.difference, m(1000) - r.theoretical);
                            assert_eq!(r.status == CloseStatus::Ok, r.difference.is_zero());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_difference_is_linear_in_each_input() {
        let (cash, card) = catalog();
        let payments = vec![pay(&cash, 3000), pay(&card, 2000)];
        let expenses = vec![expense("milk", 1000)];
        let base = ReconciliationInput {
            opening: m(10000),
            sales: m(5000),
            withdrawal: m(1000),
            payments: &payments,
            expenses: &expenses,
            actual: m(11000),
        };
        let methods = [cash.clone(), card.clone()];
        let d0 = reconcile(&base, &methods).difference;
        let x = m(137);

        let shifted = ReconciliationInput {
            actual: base.actual + x,
            ..base
        };
        assert_eq!(reconcile(&shifted, &methods).difference, d0 + x);

        let shifted = ReconciliationInput {
            opening: base.opening + x,
            ..base
        };
        assert_eq!(reconcile(&shifted, &methods).difference, d0 - x);

        let shifted = ReconciliationInput {
            sales: base.sales + x,
            ..base
        };
        assert_eq!(reconcile(&shifted, &methods).difference, d0 - x);

        let shifted = ReconciliationInput {
            withdrawal: base.withdrawal + x,
            ..base
        };
        assert_eq!(reconcile(&shifted, &methods).difference, d0 + x);

        let more_expenses = vec![expense("milk", 1000 + 137)];
        let shifted = ReconciliationInput {
            expenses: &more_expenses,
            ..base
        };
        assert_eq!(reconcile(&shifted, &methods).difference, d0 + x);

        let more_card = vec![pay(&cash, 3000), pay(&card, 2000 + 137)];
        let shifted = ReconciliationInput {
            payments: &more_card,
            ..base
        };
        assert_eq!(reconcile(&shifted, &methods).difference, d0 + x);
    }

    #[test]
    fn test_unknown_method_counts_as_non_cash() {
        let stray = CashClosePayment {
            payment_method_id: PaymentMethodId::new(),
            amount: m(2500),
        };
        let input = ReconciliationInput {
            opening: m(10000),
            sales: m(2500),
            withdrawal: Money::zero(),
            payments: std::slice::from_ref(&stray),
            expenses: &[],
            actual: m(10000),
        };

        let r = reconcile(&input, &[]);
        assert_eq!(r.non_cash_total, m(2500));
        assert_eq!(r.non_cash_breakdown[0].name, UNKNOWN_METHOD_LABEL);
        assert_eq!(r.status, CloseStatus::Ok);
    }

    #[test]
    fn test_non_positive_non_cash_amounts_ignored() {
        let (cash, card) = catalog();
        let payments = vec![pay(&card, 0), pay(&card, -500)];
        let input = ReconciliationInput {
            opening: m(1000),
            sales: Money::zero(),
            withdrawal: Money::zero(),
            payments: &payments,
            expenses: &[],
            actual: m(1000),
        };

        let r = reconcile(&input, &[cash, card]);
        assert!(r.non_cash_total.is_zero());
        assert!(r.non_cash_breakdown.is_empty());
        assert_eq!(r.status, CloseStatus::Ok);
    }

    #[test]
    fn test_payments_mismatch_is_soft() {
        let (cash, card) = catalog();
        let payments = vec![pay(&cash, 5000), pay(&card, 4000)];
        let input = ReconciliationInput {
            opening: m(1000),
            sales: m(10000),
            withdrawal: Money::zero(),
            payments: &payments,
            expenses: &[],
            actual: m(7000),
        };

        let r = reconcile(&input, &[cash.clone(), card.clone()]);
        assert_eq!(r.status, CloseStatus::Ok);
        assert_eq!(
            r.warnings,
            vec![ReconciliationWarning::PaymentsMismatch {
                payments_total: m(9000),
                sales: m(10000),
                delta: m(-1000),
            }]
        );

        let within = vec![pay(&cash, 5000), pay(&card, 4999)];
        let input = ReconciliationInput {
            sales: m(10000),
            payments: &within,
            ..input
        };
        assert!(!reconcile(&input, &[cash, card]).has_warnings());
    }

    #[test]
    fn test_breakdown_groups_by_method() {
        let (cash, card) = catalog();
        let wallet = PaymentMethod::new("Satispay", false);
        let payments = vec![pay(&card, 1000), pay(&wallet, 300), pay(&card, 500)];
        let input = ReconciliationInput {
            opening: Money::zero(),
            sales: m(1800),
            withdrawal: Money::zero(),
            payments: &payments,
            expenses: &[],
            actual: Money::zero(),
        };

        let r = reconcile(&input, &[cash, card, wallet]);
        let lines: Vec<_> = r
            .non_cash_breakdown
            .iter()
            .map(|l| (l.name.as_str(), l.amount.cents()))
            .collect();
        assert_eq!(lines, vec![("POS", 1500), ("Satispay", 300)]);
    }
}
