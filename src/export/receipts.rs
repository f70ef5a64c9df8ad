//! Receipt archive
//!
//! Copies the receipt photos of a date range into one folder per store,
//! named `<date>_<close id>.<ext>` so they sort by day.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::settings::Settings;
use crate::error::{CloseError, CloseResult};
use crate::models::{CashClose, CashCloseId, StoreId};
use crate::services::{CloseFilter, CloseService};
use crate::storage::Storage;

use super::csv::ReportRange;

/// Outcome of a receipt export
#[derive(Debug, Default)]
pub struct ReceiptExport {
    pub copied: usize,
    /// Closes whose receipt file could not be read
    pub missing: Vec<CashCloseId>,
}

/// File name of a close's receipt inside the archive
pub fn receipt_file_name(close: &CashClose, content_path: &str) -> String {
    let extension = Path::new(content_path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("bin");
    format!("{}_{}.{}", close.date, close.id, extension)
}

/// Store names can hold anything; folders get letters, digits, spaces, `-`
/// and `_` only
fn folder_name(name: &str, id: StoreId) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        id.to_string()
    } else {
        cleaned
    }
}

/// Copy every receipt of the range below `dir`; an empty range is an error
pub fn export_receipts(
    storage: &Storage,
    settings: &Settings,
    range: &ReportRange,
    dir: &Path,
) -> CloseResult<ReceiptExport> {
    let closes = CloseService::new(storage, settings).list(&CloseFilter {
        store_id: range.store_id,
        start: Some(range.start),
        end: Some(range.end),
        ..Default::default()
    })?;
    if closes.iter().all(|c| c.receipt_image.is_none()) {
        return Err(CloseError::Export("no receipts in the selected range".into()));
    }

    let store_names: HashMap<StoreId, String> = storage
        .stores
        .get_all()?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let mut result = ReceiptExport::default();
    for close in &closes {
        let Some(content_path) = close.receipt_image.as_deref() else {
            continue;
        };

        let bytes = match storage.receipts.read(content_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(close = %close.id, error = %e, "receipt missing from the blob store");
                result.missing.push(close.id);
                continue;
            }
        };

        let folder = dir.join(folder_name(
            store_names.get(&close.store_id).map(String::as_str).unwrap_or_default(),
            close.store_id,
        ));
        fs::create_dir_all(&folder).map_err(|e| {
            CloseError::Export(format!("Cannot create {}: {}", folder.display(), e))
        })?;

        let target = folder.join(receipt_file_name(close, content_path));
        fs::write(&target, &bytes)
            .map_err(|e| CloseError::Export(format!("Cannot write {}: {}", target.display(), e)))?;
        debug!(close = %close.id, path = %target.display(), "receipt exported");
        result.copied += 1;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ControlClosePaths;
    use crate::models::{CloseStatus, Money, Store};
    use crate::storage::initialize_storage;
    use chrono::{NaiveDate, Utc};
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

    fn add_close(storage: &Storage, store: &Store, date: NaiveDate, receipt: Option<&str>) -> CashClose {
        let receipt_image = receipt.map(|name| storage.receipts.put(name, name.as_bytes()).unwrap());
        let close = CashClose {
            id: CashCloseId::new(),
            store_id: store.id,
            date,
            compiler_name: "Giulia".into(),
            notes: None,
            total_sales_amount: Money::from_cents(10000),
            bank_withdrawal_amount: Money::zero(),
            opening_cash_fund: Money::zero(),
            theoretical_cash_fund: Money::from_cents(10000),
            actual_cash_fund: Money::from_cents(10000),
            difference: Money::zero(),
            status: CloseStatus::Ok,
            receipt_image,
            payments: vec![],
            expenses: vec![],
            created_at: Utc::now(),
        };
        storage.closes.create(close.clone(), false).unwrap();
        close
    }

    #[test]
    fn test_receipts_land_in_store_folders() {
        let (_temp_dir, storage) = create_test_storage();
        let centro = Store::new("Centro", Money::zero());
        let porto = Store::new("Porto/Est", Money::zero());
        storage.stores.upsert(centro.clone()).unwrap();
        storage.stores.upsert(porto.clone()).unwrap();

        let first = add_close(&storage, &centro, ymd(2), Some("scontrino.jpg"));
        let second = add_close(&storage, &porto, ymd(3), Some("Foto.PNG"));
        add_close(&storage, &centro, ymd(4), None);
        add_close(&storage, &centro, ymd(20), Some("later.jpg"));

        let out = TempDir::new().unwrap();
        let range = ReportRange { start: ymd(1), end: ymd(10), store_id: None };
        let result = export_receipts(&storage, &Settings::default(), &range, out.path()).unwrap();

        assert_eq!(result.copied, 2);
        assert!(result.missing.is_empty());

        let first_path = out.path().join("Centro").join(format!("2025-06-02_{}.jpg", first.id));
        assert_eq!(fs::read(first_path).unwrap(), b"scontrino.jpg");
        let second_path = out.path().join("Porto_Est").join(format!("2025-06-03_{}.png", second.id));
        assert!(second_path.is_file());
        assert_eq!(fs::read_dir(out.path().join("Centro")).unwrap().count(), 1);
    }

    #[test]
    fn test_store_filter_and_missing_blobs() {
        let (_temp_dir, storage) = create_test_storage();
        let centro = Store::new("Centro", Money::zero());
        let porto = Store::new("Porto", Money::zero());
        storage.stores.upsert(centro.clone()).unwrap();
        storage.stores.upsert(porto.clone()).unwrap();

        let gone = add_close(&storage, &centro, ymd(2), Some("a.jpg"));
        storage.receipts.delete(gone.receipt_image.as_deref().unwrap()).unwrap();
        add_close(&storage, &centro, ymd(3), Some("b.jpg"));
        add_close(&storage, &porto, ymd(3), Some("c.jpg"));

        let out = TempDir::new().unwrap();
        let range = ReportRange { start: ymd(1), end: ymd(10), store_id: Some(centro.id) };
        let result = export_receipts(&storage, &Settings::default(), &range, out.path()).unwrap();

        assert_eq!(result.copied, 1);
        assert_eq!(result.missing, vec![gone.id]);
        assert!(!out.path().join("Porto").exists());
    }

    #[test]
    fn test_range_without_receipts_is_an_error() {
        let (_temp_dir, storage) = create_test_storage();
        let centro = Store::new("Centro", Money::zero());
        storage.stores.upsert(centro.clone()).unwrap();
        add_close(&storage, &centro, ymd(2), None);

        let out = TempDir::new().unwrap();
        let range = ReportRange { start: ymd(1), end: ymd(10), store_id: None };
        let err = export_receipts(&storage, &Settings::default(), &range, out.path()).unwrap_err();
        assert!(matches!(err, CloseError::Export(_)));
    }
}
