//! Cash close service
//!
//! Queries over stored closes and the submission pipeline: receipt upload,
//! atomic create, compensation on failure, then a best-effort notification.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{CloseError, CloseResult};
use crate::models::{
    CashClose, CashCloseExpense, CashCloseId, CashClosePayment, CloseStatus, Money, StoreId,
};
use crate::notify::{CloseNotifier, CloseSummary};
use crate::storage::Storage;

/// Query filter for closes; every field is optional
#[derive(Debug, Clone, Default)]
pub struct CloseFilter {
    pub store_id: Option<StoreId>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub status: Option<CloseStatus>,
}

impl CloseFilter {
    pub(crate) fn matches(&self, close: &CashClose) -> bool {
        self.store_id.map_or(true, |s| close.store_id == s)
            && self.date.map_or(true, |d| close.date == d)
            && self.start.map_or(true, |d| close.date >= d)
            && self.end.map_or(true, |d| close.date <= d)
            && self.status.map_or(true, |s| close.status == s)
    }
}

/// Receipt photo attached to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A close ready to be stored, derived fields included
#[derive(Debug, Clone, PartialEq)]
pub struct NewClose {
    pub store_id: StoreId,
    pub date: NaiveDate,
    pub compiler_name: String,
    pub notes: Option<String>,
    pub total_sales_amount: Money,
    pub bank_withdrawal_amount: Money,
    pub opening_cash_fund: Money,
    pub theoretical_cash_fund: Money,
    pub actual_cash_fund: Money,
    pub difference: Money,
    pub status: CloseStatus,
    pub payments: Vec<CashClosePayment>,
    pub expenses: Vec<CashCloseExpense>,
}

impl NewClose {
    fn into_close(self, receipt_image: Option<String>) -> CashClose {
        CashClose {
            id: CashCloseId::new(),
            store_id: self.store_id,
            date: self.date,
            compiler_name: self.compiler_name.trim().to_string(),
            notes: self.notes,
            total_sales_amount: self.total_sales_amount,
            bank_withdrawal_amount: self.bank_withdrawal_amount,
            opening_cash_fund: self.opening_cash_fund,
            theoretical_cash_fund: self.theoretical_cash_fund,
            actual_cash_fund: self.actual_cash_fund,
            difference: self.difference,
            status: self.status,
            receipt_image,
            payments: self.payments,
            expenses: self.expenses,
            created_at: Utc::now(),
        }
    }
}

/// Result of a successful submission
#[derive(Debug, Clone)]
pub struct SubmittedClose {
    pub close: CashClose,
    /// Whether the summary reached the notifier
    pub notified: bool,
}

pub struct CloseService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> CloseService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    pub fn get(&self, id: CashCloseId) -> CloseResult<Option<CashClose>> {
        self.storage.closes.get(id)
    }

    /// Find a close by full or short id
    pub fn resolve(&self, identifier: &str) -> CloseResult<CashClose> {
        let found = match identifier.parse::<CashCloseId>() {
            Ok(id) => self.storage.closes.get(id)?,
            Err(_) => {
                let wanted = identifier.trim();
                self.storage
                    .closes
                    .get_all()?
                    .into_iter()
                    .find(|c| c.id.to_string() == wanted)
            }
        };
        found.ok_or_else(|| CloseError::close_not_found(identifier))
    }

    /// Closes matching a filter, newest first
    pub fn list(&self, filter: &CloseFilter) -> CloseResult<Vec<CashClose>> {
        Ok(self
            .storage
            .closes
            .get_all()?
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect())
    }

    /// Latest close of the store strictly before `date`
    pub fn previous_close(&self, store_id: StoreId, date: NaiveDate) -> CloseResult<Option<CashClose>> {
        self.storage.closes.latest_before(store_id, date)
    }

    /// Cash fund carried into `date`: the previous close's counted cash, or
    /// the store's configured fund when there is no earlier close
    pub fn opening_fund(&self, store_id: StoreId, date: NaiveDate) -> CloseResult<Money> {
        if let Some(previous) = self.previous_close(store_id, date)? {
            return Ok(previous.actual_cash_fund);
        }

        let store = self
            .storage
            .stores
            .get(store_id)?
            .ok_or_else(|| CloseError::store_not_found(store_id.to_string()))?;
        Ok(store.opening_cash_fund)
    }

    /// Store a close
    ///
    /// The receipt is uploaded first. If the create then fails, the uploaded
    /// receipt is deleted again and the create error is returned. The
    /// notification runs last and its failure only clears `notified`.
    pub fn submit(
        &self,
        new_close: NewClose,
        receipt: Option<&ReceiptAttachment>,
        notifier: &dyn CloseNotifier,
    ) -> CloseResult<SubmittedClose> {
        let store = self
            .storage
            .stores
            .get(new_close.store_id)?
            .ok_or_else(|| CloseError::store_not_found(new_close.store_id.to_string()))?;
        if !store.active {
            return Err(CloseError::Validation(format!(
                "Store '{}' is not active",
                store.name
            )));
        }

        // Reject before uploading anything
        new_close
            .clone()
            .into_close(None)
            .validate()
            .map_err(CloseError::Validation)?;

        let receipt_path = match receipt {
            Some(attachment) => Some(
                self.storage
                    .receipts
                    .put(&attachment.file_name, &attachment.bytes)?,
            ),
            None => None,
        };

        let close = new_close.into_close(receipt_path.clone());

        if let Err(e) = self
            .storage
            .closes
            .create(close.clone(), self.settings.enforce_unique_close)
        {
            if let Some(path) = &receipt_path {
                match self.storage.receipts.delete(path) {
                    Ok(()) => warn!(path = %path, "close rejected, uploaded receipt removed"),
                    Err(cleanup) => {
                        warn!(path = %path, error = %cleanup, "close rejected, receipt left behind")
                    }
                }
            }
            return Err(e);
        }

        if let Err(e) = self.storage.log_create(
            EntityType::CashClose,
            close.id.to_string(),
            Some(format!("{} {}", store.name, close.date)),
            &close,
        ) {
            warn!(error = %e, "failed to write audit entry for close");
        }

        info!(
            store = %store.name,
            date = %close.date,
            status = %close.status,
            difference = %close.difference,
            "cash close submitted"
        );

        let notified = self.send_summary(&close, &store, notifier);
        Ok(SubmittedClose { close, notified })
    }

    fn send_summary(
        &self,
        close: &CashClose,
        store: &crate::models::Store,
        notifier: &dyn CloseNotifier,
    ) -> bool {
        if !self.settings.notifications_enabled {
            return false;
        }

        let recipients = store.recipients();
        if recipients.is_empty() {
            return false;
        }

        let message = CloseSummary::from_close(close, store)
            .to_message(recipients, &self.settings.currency_symbol);
        match notifier.notify(&message) {
            Ok(()) => true,
            Err(e) => {
                warn!(store = %store.name, error = %e, "close summary not delivered");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ControlClosePaths;
    use crate::notify::{CloseMessage, NoopNotifier};
    use crate::services::StoreService;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct RecordingNotifier {
        sent: RefCell<Vec<CloseMessage>>,
    }

    impl CloseNotifier for RecordingNotifier {
        fn notify(&self, message: &CloseMessage) -> CloseResult<()> {
            self.sent.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl CloseNotifier for FailingNotifier {
        fn notify(&self, _message: &CloseMessage) -> CloseResult<()> {
            Err(CloseError::Notification("smtp down".into()))
        }
    }

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ControlClosePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn balanced(store_id: StoreId, date: NaiveDate, fund: i64) -> NewClose {
        NewClose {
            store_id,
            date,
            compiler_name: "Giulia".into(),
            notes: None,
            total_sales_amount: Money::zero(),
            bank_withdrawal_amount: Money::zero(),
            opening_cash_fund: Money::from_cents(fund),
            theoretical_cash_fund: Money::from_cents(fund),
            actual_cash_fund: Money::from_cents(fund),
            difference: Money::zero(),
            status: CloseStatus::Ok,
            payments: vec![],
            expenses: vec![],
        }
    }

    fn receipt() -> ReceiptAttachment {
        ReceiptAttachment {
            file_name: "Scontrino.jpg".into(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[test]
    fn test_opening_fund_falls_back_to_store() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = StoreService::new(&storage)
            .create("Centro", Money::from_cents(15000), None)
            .unwrap();
        let service = CloseService::new(&storage, &settings);

        assert_eq!(service.opening_fund(store.id, day(2)).unwrap().cents(), 15000);

        service
            .submit(balanced(store.id, day(1), 17250), None, &NoopNotifier)
            .unwrap();
        assert_eq!(service.opening_fund(store.id, day(2)).unwrap().cents(), 17250);
        // Same day is not "previous"
        assert_eq!(service.opening_fund(store.id, day(1)).unwrap().cents(), 15000);

        assert!(service
            .opening_fund(StoreId::new(), day(2))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_submit_stores_receipt_and_notifies() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = StoreService::new(&storage)
            .create("Centro", Money::zero(), Some("boss@shop.it"))
            .unwrap();
        let service = CloseService::new(&storage, &settings);
        let notifier = RecordingNotifier {
            sent: RefCell::new(Vec::new()),
        };

        let submitted = service
            .submit(balanced(store.id, day(3), 10000), Some(&receipt()), &notifier)
            .unwrap();

        let path = submitted.close.receipt_image.clone().unwrap();
        assert!(storage.receipts.exists(&path));
        assert!(submitted.notified);
        assert_eq!(notifier.sent.borrow()[0].recipients, vec!["boss@shop.it"]);
        assert_eq!(service.resolve(&submitted.close.id.to_string()).unwrap().id, submitted.close.id);
    }

    #[test]
    fn test_failed_create_removes_uploaded_receipt() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = StoreService::new(&storage)
            .create("Centro", Money::zero(), None)
            .unwrap();
        let service = CloseService::new(&storage, &settings);

        service
            .submit(balanced(store.id, day(3), 100), None, &NoopNotifier)
            .unwrap();

        let err = service
            .submit(balanced(store.id, day(3), 200), Some(&receipt()), &NoopNotifier)
            .unwrap_err();
        assert!(matches!(err, CloseError::Duplicate { .. }));
        assert_eq!(storage.receipts.count().unwrap(), 0);
        assert_eq!(storage.closes.count().unwrap(), 1);
    }

    #[test]
    fn test_uniqueness_can_be_relaxed() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings {
            enforce_unique_close: false,
            ..Settings::default()
        };
        let store = StoreService::new(&storage)
            .create("Centro", Money::zero(), None)
            .unwrap();
        let service = CloseService::new(&storage, &settings);

        service.submit(balanced(store.id, day(3), 100), None, &NoopNotifier).unwrap();
        service.submit(balanced(store.id, day(3), 100), None, &NoopNotifier).unwrap();
        assert_eq!(storage.closes.count().unwrap(), 2);
    }

    #[test]
    fn test_notifier_failure_does_not_fail_submission() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = StoreService::new(&storage)
            .create("Centro", Money::zero(), Some("boss@shop.it"))
            .unwrap();
        let service = CloseService::new(&storage, &settings);

        let submitted = service
            .submit(balanced(store.id, day(3), 100), None, &FailingNotifier)
            .unwrap();
        assert!(!submitted.notified);
        assert!(storage.closes.get(submitted.close.id).unwrap().is_some());
    }

    #[test]
    fn test_inconsistent_payload_rejected_before_upload() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = StoreService::new(&storage)
            .create("Centro", Money::zero(), None)
            .unwrap();
        let service = CloseService::new(&storage, &settings);

        let mut bad = balanced(store.id, day(3), 100);
        bad.difference = Money::from_cents(5);
        let err = service.submit(bad, Some(&receipt()), &NoopNotifier).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(storage.receipts.count().unwrap(), 0);
    }

    #[test]
    fn test_list_filters() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let stores = StoreService::new(&storage);
        let centro = stores.create("Centro", Money::zero(), None).unwrap();
        let stazione = stores.create("Stazione", Money::zero(), None).unwrap();
        let service = CloseService::new(&storage, &settings);

        for d in 1..=4 {
            service.submit(balanced(centro.id, day(d), 100), None, &NoopNotifier).unwrap();
        }
        let mut off = balanced(stazione.id, day(2), 100);
        off.actual_cash_fund = Money::from_cents(1000);
        off.difference = Money::from_cents(900);
        off.status = CloseStatus::Ko;
        service.submit(off, None, &NoopNotifier).unwrap();

        let filter = CloseFilter {
            store_id: Some(centro.id),
            start: Some(day(2)),
            end: Some(day(3)),
            ..Default::default()
        };
        let dates: Vec<_> = service.list(&filter).unwrap().into_iter().map(|c| c.date).collect();
        assert_eq!(dates, vec![day(3), day(2)]);

        let ko = CloseFilter {
            status: Some(CloseStatus::Ko),
            ..Default::default()
        };
        assert_eq!(service.list(&ko).unwrap().len(), 1);

        let on_day = CloseFilter {
            date: Some(day(2)),
            ..Default::default()
        };
        assert_eq!(service.list(&on_day).unwrap().len(), 2);
    }
}
