//! Close wizard state machine
//!
//! Walks one close through the seven steps. Forward moves are gated per
//! step; derived figures are recomputed from the form whenever they are
//! asked for, so no step keeps private state.

use chrono::NaiveDate;
use tracing::debug;

use crate::config::settings::Settings;
use crate::error::{CloseError, CloseResult};
use crate::models::{Money, PaymentMethod, PaymentMethodId, Profile, Store, StoreId};
use crate::notify::CloseNotifier;
use crate::services::{
    reconcile, CloseService, NewClose, ProfileService, ReceiptAttachment, Reconciliation,
    ReconciliationInput, SubmittedClose,
};
use crate::storage::Storage;

use super::form::{lenient_amount, policy_amount, CloseForm, ExpenseRow, PaymentRow};
use super::step::WizardStep;

pub struct CloseWizard<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
    step: WizardStep,
    form: CloseForm,
    stores: Vec<Store>,
    /// Every method, inactive ones included, so older ids still resolve
    catalog: Vec<PaymentMethod>,
}

impl<'a> CloseWizard<'a> {
    /// Start a wizard for the signed-in profile
    ///
    /// The store is preselected when the profile's default store is
    /// available, or when only one store is. The compiler defaults to the
    /// username and the opening fund is looked up at once.
    pub fn start(
        storage: &'a Storage,
        settings: &'a Settings,
        profile: &Profile,
        date: NaiveDate,
    ) -> CloseResult<Self> {
        if profile.blocked {
            return Err(CloseError::Unauthorized(format!(
                "{} is blocked",
                profile.username
            )));
        }

        let stores = ProfileService::new(storage).available_stores(profile)?;
        let catalog = storage.payment_methods.get_all()?;
        let payments = storage
            .payment_methods
            .get_active()?
            .iter()
            .map(PaymentRow::for_method)
            .collect();

        let store_id = profile
            .default_store_id
            .filter(|id| stores.iter().any(|s| s.id == *id))
            .or(match stores.as_slice() {
                [only] => Some(only.id),
                _ => None,
            });

        let mut wizard = Self {
            storage,
            settings,
            step: WizardStep::Setup,
            form: CloseForm {
                store_id,
                date: Some(date),
                compiler_name: profile.username.clone(),
                payments,
                ..Default::default()
            },
            stores,
            catalog,
        };
        wizard.refresh_opening_fund()?;
        Ok(wizard)
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &CloseForm {
        &self.form
    }

    /// Stores the operator may pick from
    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn selected_store(&self) -> Option<&Store> {
        self.form
            .store_id
            .and_then(|id| self.stores.iter().find(|s| s.id == id))
    }

    /// Whether the current step's required fields are filled in
    pub fn can_advance(&self) -> bool {
        match self.step {
            WizardStep::Setup => {
                self.form.store_id.is_some()
                    && self.form.date.is_some()
                    && !self.form.compiler_name.trim().is_empty()
            }
            WizardStep::Sales => {
                self.form.receipt.is_some() && !self.form.total_sales.trim().is_empty()
            }
            _ => true,
        }
    }

    /// Move one step forward; `false` when gated or already at the end
    pub fn next(&mut self) -> bool {
        match self.step.next() {
            Some(next) if self.can_advance() => {
                debug!(from = ?self.step, to = ?next, "wizard advanced");
                self.step = next;
                true
            }
            _ => false,
        }
    }

    /// Move one step back; `false` at the first step
    pub fn previous(&mut self) -> bool {
        match self.step.previous() {
            Some(previous) => {
                self.step = previous;
                true
            }
            None => false,
        }
    }

    pub fn set_store(&mut self, store_id: StoreId) -> CloseResult<()> {
        if !self.stores.iter().any(|s| s.id == store_id) {
            return Err(CloseError::Unauthorized(format!(
                "store {} is not available to this user",
                store_id
            )));
        }
        self.form.store_id = Some(store_id);
        self.refresh_opening_fund()
    }

    pub fn set_date(&mut self, date: NaiveDate) -> CloseResult<()> {
        self.form.date = Some(date);
        self.refresh_opening_fund()
    }

    pub fn set_compiler_name(&mut self, name: &str) {
        self.form.compiler_name = name.to_string();
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.form.notes = notes.to_string();
    }

    pub fn attach_receipt(&mut self, receipt: ReceiptAttachment) {
        self.form.receipt = Some(receipt);
    }

    pub fn set_total_sales(&mut self, amount: &str) {
        self.form.total_sales = amount.to_string();
    }

    pub fn set_payment(&mut self, method_id: PaymentMethodId, amount: &str) -> CloseResult<()> {
        let row = self
            .form
            .payments
            .iter_mut()
            .find(|row| row.method_id == method_id)
            .ok_or_else(|| CloseError::payment_method_not_found(method_id.to_string()))?;
        row.amount = amount.to_string();
        Ok(())
    }

    pub fn add_expense(&mut self, description: &str, amount: &str) {
        self.form.expenses.push(ExpenseRow {
            description: description.to_string(),
            amount: amount.to_string(),
        });
    }

    pub fn remove_expense(&mut self, index: usize) -> bool {
        if index < self.form.expenses.len() {
            self.form.expenses.remove(index);
            true
        } else {
            false
        }
    }

    pub fn set_bank_withdrawal(&mut self, amount: &str) {
        self.form.bank_withdrawal = amount.to_string();
    }

    pub fn set_actual_cash_fund(&mut self, amount: &str) {
        self.form.actual_cash_fund = amount.to_string();
    }

    /// Derived figures for the current form, blank amounts read as zero
    pub fn derived(&self) -> Reconciliation {
        let payments = self.form.lenient_payments();
        let expenses = self.form.lenient_expenses();
        let input = ReconciliationInput {
            opening: self.form.opening_cash_fund,
            sales: lenient_amount(&self.form.total_sales),
            withdrawal: lenient_amount(&self.form.bank_withdrawal),
            payments: &payments,
            expenses: &expenses,
            actual: lenient_amount(&self.form.actual_cash_fund),
        };
        reconcile(&input, &self.catalog)
    }

    /// Build the record to store, reading amounts under the input policy
    pub fn build_submission(&self) -> CloseResult<NewClose> {
        let policy = self.settings.numeric_input;
        let form = &self.form;

        let store_id = form
            .store_id
            .ok_or_else(|| CloseError::Validation("Select a store".into()))?;
        let date = form
            .date
            .ok_or_else(|| CloseError::Validation("Select a date".into()))?;
        if form.compiler_name.trim().is_empty() {
            return Err(CloseError::Validation("Compiler name is required".into()));
        }

        let sales = policy_amount("Total sales", &form.total_sales, policy, true)?;
        let withdrawal = policy_amount("Bank withdrawal", &form.bank_withdrawal, policy, false)?;
        let actual = policy_amount("Cash count", &form.actual_cash_fund, policy, true)?;
        let payments = form.submitted_payments(policy)?;
        let expenses = form.submitted_expenses(policy)?;

        let result = reconcile(
            &ReconciliationInput {
                opening: form.opening_cash_fund,
                sales,
                withdrawal,
                payments: &payments,
                expenses: &expenses,
                actual,
            },
            &self.catalog,
        );

        let notes = form.notes.trim();
        Ok(NewClose {
            store_id,
            date,
            compiler_name: form.compiler_name.trim().to_string(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
            total_sales_amount: sales,
            bank_withdrawal_amount: withdrawal,
            opening_cash_fund: form.opening_cash_fund,
            theoretical_cash_fund: result.theoretical,
            actual_cash_fund: actual,
            difference: result.difference,
            status: result.status,
            payments,
            expenses,
        })
    }

    /// Submit from the review step
    pub fn submit(&self, notifier: &dyn CloseNotifier) -> CloseResult<SubmittedClose> {
        if !self.step.is_last() {
            return Err(CloseError::Submission(format!(
                "still at {}, reach the review step first",
                self.step.title()
            )));
        }

        let new_close = self.build_submission()?;
        CloseService::new(self.storage, self.settings).submit(
            new_close,
            self.form.receipt.as_ref(),
            notifier,
        )
    }

    fn refresh_opening_fund(&mut self) -> CloseResult<()> {
        self.form.opening_cash_fund = match (self.form.store_id, self.form.date) {
            (Some(store_id), Some(date)) => {
                CloseService::new(self.storage, self.settings).opening_fund(store_id, date)?
            }
            _ => Money::zero(),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ControlClosePaths;
    use crate::config::settings::InputPolicy;
    use crate::models::{CloseStatus, Role};
    use crate::notify::NoopNotifier;
    use crate::services::StoreService;
    use crate::storage::initialize_storage;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ControlClosePaths::with_base_dir(temp_dir.path().to_path_buf());
        initialize_storage(&paths).unwrap();
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn operator_for(stores: &[&Store]) -> Profile {
        let mut profile = Profile::new("giulia", Role::Operator);
        profile.allowed_stores = stores.iter().map(|s| s.id).collect::<BTreeSet<_>>();
        profile
    }

    fn receipt() -> ReceiptAttachment {
        ReceiptAttachment {
            file_name: "scontrino.jpg".into(),
            bytes: vec![0xFF, 0xD8],
        }
    }

    fn method_id(storage: &Storage, name: &str) -> PaymentMethodId {
        storage.payment_methods.get_by_name(name).unwrap().unwrap().id
    }

    /// Fill every step with the reference figures and stop at review
    fn fill_reference(wizard: &mut CloseWizard, storage: &Storage) {
        assert!(wizard.next());
        wizard.attach_receipt(receipt());
        wizard.set_total_sales("200.00");
        assert!(wizard.next());
        wizard.set_payment(method_id(storage, "Contanti"), "100").unwrap();
        wizard.set_payment(method_id(storage, "POS"), "100").unwrap();
        assert!(wizard.next());
        wizard.add_expense("coffee", "5");
        assert!(wizard.next());
        wizard.set_bank_withdrawal("50");
        assert!(wizard.next());
        wizard.set_actual_cash_fund("94");
        assert!(wizard.next());
        assert_eq!(wizard.step(), WizardStep::Review);
    }

    #[test]
    fn test_compiler_name_gates_setup() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = StoreService::new(&storage)
            .create("Centro", Money::zero(), None)
            .unwrap();
        let profile = operator_for(&[&store]);

        let mut wizard = CloseWizard::start(&storage, &settings, &profile, day(2)).unwrap();
        wizard.set_compiler_name("   ");
        assert!(!wizard.next());
        assert_eq!(wizard.step(), WizardStep::Setup);

        wizard.set_compiler_name("Giulia");
        assert!(wizard.next());
        assert_eq!(wizard.step(), WizardStep::Sales);
    }

    #[test]
    fn test_sales_needs_receipt_and_amount() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = StoreService::new(&storage)
            .create("Centro", Money::zero(), None)
            .unwrap();
        let mut wizard =
            CloseWizard::start(&storage, &settings, &operator_for(&[&store]), day(2)).unwrap();

        assert!(wizard.next());
        wizard.set_total_sales("120");
        assert!(!wizard.next());
        wizard.attach_receipt(receipt());
        assert!(wizard.next());
        assert_eq!(wizard.step(), WizardStep::Payments);
    }

    #[test]
    fn test_bounds_are_no_ops() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = StoreService::new(&storage)
            .create("Centro", Money::zero(), None)
            .unwrap();
        let mut wizard =
            CloseWizard::start(&storage, &settings, &operator_for(&[&store]), day(2)).unwrap();

        assert!(!wizard.previous());
        assert_eq!(wizard.step(), WizardStep::Setup);

        fill_reference(&mut wizard, &storage);
        assert!(!wizard.next());
        assert_eq!(wizard.step(), WizardStep::Review);
        assert!(wizard.previous());
        assert_eq!(wizard.step(), WizardStep::Count);
    }

    #[test]
    fn test_prefill_from_session() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let stores = StoreService::new(&storage);
        let centro = stores.create("Centro", Money::from_cents(5000), None).unwrap();
        let stazione = stores.create("Stazione", Money::from_cents(8000), None).unwrap();

        let single = CloseWizard::start(&storage, &settings, &operator_for(&[&centro]), day(2)).unwrap();
        assert_eq!(single.form().store_id, Some(centro.id));
        assert_eq!(single.form().compiler_name, "giulia");
        assert_eq!(single.form().opening_cash_fund, Money::from_cents(5000));

        let mut both = operator_for(&[&centro, &stazione]);
        let wizard = CloseWizard::start(&storage, &settings, &both, day(2)).unwrap();
        assert_eq!(wizard.form().store_id, None);
        assert_eq!(wizard.form().opening_cash_fund, Money::zero());

        both.default_store_id = Some(stazione.id);
        let wizard = CloseWizard::start(&storage, &settings, &both, day(2)).unwrap();
        assert_eq!(wizard.selected_store().map(|s| s.name.as_str()), Some("Stazione"));
        assert_eq!(wizard.form().opening_cash_fund, Money::from_cents(8000));

        let names: Vec<_> = wizard.form().payments.iter().map(|r| r.method_name.as_str()).collect();
        assert_eq!(names, vec!["Contanti", "POS"]);
    }

    #[test]
    fn test_store_outside_assignment_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let stores = StoreService::new(&storage);
        let centro = stores.create("Centro", Money::zero(), None).unwrap();
        let stazione = stores.create("Stazione", Money::zero(), None).unwrap();

        let mut wizard =
            CloseWizard::start(&storage, &settings, &operator_for(&[&centro]), day(2)).unwrap();
        assert!(matches!(
            wizard.set_store(stazione.id),
            Err(CloseError::Unauthorized(_))
        ));
        assert_eq!(wizard.form().store_id, Some(centro.id));
    }

    #[test]
    fn test_blocked_profile_cannot_start() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let mut profile = Profile::new("mario", Role::Admin);
        profile.blocked = true;

        assert!(matches!(
            CloseWizard::start(&storage, &settings, &profile, day(2)),
            Err(CloseError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_reference_close_submits_and_carries_fund() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let store = StoreService::new(&storage)
            .create("Centro", Money::from_cents(5000), None)
            .unwrap();
        let profile = operator_for(&[&store]);

        let mut wizard = CloseWizard::start(&storage, &settings, &profile, day(2)).unwrap();
        assert!(matches!(
            wizard.submit(&NoopNotifier).unwrap_err(),
            CloseError::Submission(_)
        ));
        fill_reference(&mut wizard, &storage);

        let derived = wizard.derived();
        assert_eq!(derived.non_cash_total, Money::from_cents(10000));
        assert_eq!(derived.theoretical, Money::from_cents(9500));
        assert_eq!(derived.difference, Money::from_cents(-100));
        assert_eq!(derived.status, CloseStatus::Warning);

        let submitted = wizard.submit(&NoopNotifier).unwrap();
        assert_eq!(submitted.close.difference, Money::from_cents(-100));
        assert!(submitted.close.receipt_image.is_some());
        assert_eq!(submitted.close.payments.len(), 2);

        let mut next_day = CloseWizard::start(&storage, &settings, &profile, day(3)).unwrap();
        assert_eq!(next_day.form().opening_cash_fund, Money::from_cents(9400));

        next_day.set_date(day(1)).unwrap();
        assert_eq!(next_day.form().opening_cash_fund, Money::from_cents(5000));
    }

    #[test]
    fn test_reject_policy_blocks_blank_count_at_submit_only() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings {
            numeric_input: InputPolicy::Reject,
            ..Settings::default()
        };
        let store = StoreService::new(&storage)
            .create("Centro", Money::from_cents(5000), None)
            .unwrap();
        let mut wizard =
            CloseWizard::start(&storage, &settings, &operator_for(&[&store]), day(2)).unwrap();

        fill_reference(&mut wizard, &storage);
        wizard.set_actual_cash_fund("");
        assert_eq!(wizard.step(), WizardStep::Review);
        assert!(wizard.build_submission().unwrap_err().is_validation());

        let coerce = Settings::default();
        let mut lenient =
            CloseWizard::start(&storage, &coerce, &operator_for(&[&store]), day(2)).unwrap();
        fill_reference(&mut lenient, &storage);
        lenient.set_actual_cash_fund("");
        let close = lenient.build_submission().unwrap();
        assert_eq!(close.actual_cash_fund, Money::zero());
        assert_eq!(close.status, CloseStatus::Ko);
    }
}
