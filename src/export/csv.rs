//! CSV close report
//!
//! One row per close. Fixed columns come first, then one `Pay: <method>`
//! column per payment method seen in the range, then the expense and note
//! columns.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;

use chrono::NaiveDate;

use crate::error::{CloseError, CloseResult};
use crate::models::{CashClose, Money, StoreId};
use crate::services::reconciliation::UNKNOWN_METHOD_LABEL;
use crate::services::{CloseFilter, CloseService};
use crate::config::settings::Settings;
use crate::storage::Storage;

const LEADING_COLUMNS: [&str; 10] = [
    "Date",
    "Store",
    "Compiler",
    "Status",
    "Total Sales",
    "Bank Withdrawal",
    "Difference",
    "Opening Fund",
    "Theoretical Fund",
    "Actual Fund",
];

const TRAILING_COLUMNS: [&str; 4] = ["Expenses Total", "Expense Details", "Created At", "Notes"];

const PAYMENT_PREFIX: &str = "Pay: ";

/// Which closes go into the report
#[derive(Debug, Clone)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub store_id: Option<StoreId>,
}

fn export_error(e: impl std::fmt::Display) -> CloseError {
    CloseError::Export(e.to_string())
}

/// Suggested file name, e.g. `closes_Centro_2025-06-01_to_2025-06-30.csv`
pub fn report_file_name(store_name: Option<&str>, range: &ReportRange) -> String {
    let scope = store_name.unwrap_or("all_stores").replace(' ', "_");
    format!("closes_{}_{}_to_{}.csv", scope, range.start, range.end)
}

/// Write the close report; an empty range is an error
pub fn export_closes_csv<W: Write>(
    storage: &Storage,
    settings: &Settings,
    range: &ReportRange,
    writer: W,
) -> CloseResult<usize> {
    let mut closes = CloseService::new(storage, settings).list(&CloseFilter {
        store_id: range.store_id,
        start: Some(range.start),
        end: Some(range.end),
        ..Default::default()
    })?;
    if closes.is_empty() {
        return Err(CloseError::Export("no data in the selected range".into()));
    }

    let store_names: HashMap<StoreId, String> = storage
        .stores
        .get_all()?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let method_names: HashMap<_, _> = storage
        .payment_methods
        .get_all()?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect();

    let store_name = |close: &CashClose| {
        store_names
            .get(&close.store_id)
            .cloned()
            .unwrap_or_else(|| close.store_id.to_string())
    };
    closes.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| store_name(a).cmp(&store_name(b)))
    });

    let payments: Vec<BTreeMap<String, Money>> = closes
        .iter()
        .map(|close| {
            let mut by_method = BTreeMap::new();
            for payment in &close.payments {
                let name = method_names
                    .get(&payment.payment_method_id)
                    .map(String::as_str)
                    .unwrap_or(UNKNOWN_METHOD_LABEL);
                *by_method.entry(name.to_string()).or_insert_with(Money::zero) += payment.amount;
            }
            by_method
        })
        .collect();
    let method_columns: BTreeSet<&String> = payments.iter().flat_map(|p| p.keys()).collect();

    let mut csv = csv::Writer::from_writer(writer);

    let header = LEADING_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(method_columns.iter().map(|m| format!("{}{}", PAYMENT_PREFIX, m)))
        .chain(TRAILING_COLUMNS.iter().map(|c| c.to_string()));
    csv.write_record(header).map_err(export_error)?;

    for (close, by_method) in closes.iter().zip(&payments) {
        let details = close
            .expenses
            .iter()
            .map(|e| format!("{}: {}", e.description, e.amount))
            .collect::<Vec<_>>()
            .join(" | ");

        let mut record = vec![
            close.date.to_string(),
            store_name(close),
            close.compiler_name.clone(),
            close.status.label().to_string(),
            close.total_sales_amount.to_string(),
            close.bank_withdrawal_amount.to_string(),
            close.difference.to_string(),
            close.opening_cash_fund.to_string(),
            close.theoretical_cash_fund.to_string(),
            close.actual_cash_fund.to_string(),
        ];
        record.extend(
            method_columns
                .iter()
                .map(|m| by_method.get(*m).map(Money::to_string).unwrap_or_default()),
        );
        record.extend([
            close.expenses_total().to_string(),
            details,
            close.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            close.notes.clone().unwrap_or_default(),
        ]);
        csv.write_record(&record).map_err(export_error)?;
    }

    csv.flush().map_err(export_error)?;
    Ok(closes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ControlClosePaths;
    use crate::models::{CashCloseExpense, CashCloseId, CashClosePayment, CloseStatus, PaymentMethod, Store};
    use crate::storage::initialize_storage;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ControlClosePaths::with_base_dir(temp_dir.path().to_path_buf());
        initialize_storage(&paths).unwrap();
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn close(store: &Store, date: NaiveDate, payments: Vec<CashClosePayment>) -> CashClose {
        CashClose {
            id: CashCloseId::new(),
            store_id: store.id,
            date,
            compiler_name: "Giulia".into(),
            notes: Some("all good, mostly".into()),
            total_sales_amount: Money::from_cents(20000),
            bank_withdrawal_amount: Money::from_cents(5000),
            opening_cash_fund: Money::from_cents(5000),
            theoretical_cash_fund: Money::from_cents(9500),
            actual_cash_fund: Money::from_cents(9400),
            difference: Money::from_cents(-100),
            status: CloseStatus::Warning,
            receipt_image: None,
            payments,
            expenses: vec![
                CashCloseExpense { description: "coffee".into(), amount: Money::from_cents(500) },
                CashCloseExpense { description: "milk".into(), amount: Money::from_cents(250) },
            ],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_dynamic_payment_columns() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = Store::new("Centro", Money::zero());
        storage.stores.upsert(store.clone()).unwrap();

        let methods = storage.payment_methods.get_all().unwrap();
        let cash = methods.iter().find(|m| m.is_cash).unwrap().id;
        let pos = methods.iter().find(|m| !m.is_cash).unwrap().id;
        let satispay = PaymentMethod::new("Satispay", false);
        storage.payment_methods.upsert(satispay.clone()).unwrap();

        storage
            .closes
            .create(
                close(
                    &store,
                    ymd(2),
                    vec![
                        CashClosePayment { payment_method_id: cash, amount: Money::from_cents(10000) },
                        CashClosePayment { payment_method_id: pos, amount: Money::from_cents(10000) },
                    ],
                ),
                true,
            )
            .unwrap();
        storage
            .closes
            .create(
                close(
                    &store,
                    ymd(3),
                    vec![CashClosePayment { payment_method_id: satispay.id, amount: Money::from_cents(2000) }],
                ),
                true,
            )
            .unwrap();

        let range = ReportRange { start: ymd(1), end: ymd(30), store_id: None };
        let mut output = Vec::new();
        let rows = export_closes_csv(&storage, &settings, &range, &mut output).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Date,Store,Compiler,Status,Total Sales,Bank Withdrawal,Difference,Opening Fund,\
             Theoretical Fund,Actual Fund,Pay: Contanti,Pay: POS,Pay: Satispay,\
             Expenses Total,Expense Details,Created At,Notes"
        );
        assert!(lines[1].starts_with("2025-06-02,Centro,Giulia,WARNING,200.00,50.00,-1.00,"));
        assert!(lines[1].contains(",100.00,100.00,,7.50,coffee: 5.00 | milk: 2.50,"));
        assert!(lines[1].ends_with(",\"all good, mostly\""));
        assert!(lines[2].contains(",,,20.00,7.50,"));
    }

    #[test]
    fn test_empty_range_is_an_error() {
        let (_temp_dir, storage) = create_test_storage();
        let range = ReportRange { start: ymd(1), end: ymd(30), store_id: None };

        let err = export_closes_csv(&storage, &Settings::default(), &range, Vec::new()).unwrap_err();
        assert!(matches!(err, CloseError::Export(_)));
    }

    #[test]
    fn test_report_file_name() {
        let range = ReportRange { start: ymd(1), end: ymd(30), store_id: None };
        assert_eq!(
            report_file_name(Some("Via Roma"), &range),
            "closes_Via_Roma_2025-06-01_to_2025-06-30.csv"
        );
        assert_eq!(
            report_file_name(None, &range),
            "closes_all_stores_2025-06-01_to_2025-06-30.csv"
        );
    }
}
