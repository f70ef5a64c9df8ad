//! Interactive terminal runner for the close wizard
//!
//! Prompts on any `BufRead`/`Write` pair so the same flow serves stdin and
//! tests. A blank answer keeps the value shown in brackets. End of input
//! cancels the close.

use std::io::{BufRead, Write};
use std::path::Path;

use chrono::NaiveDate;

use crate::error::CloseResult;
use crate::models::Money;
use crate::notify::CloseNotifier;
use crate::services::{ReceiptAttachment, SubmittedClose};

use super::machine::CloseWizard;
use super::step::WizardStep;

pub struct WizardRunner<R, W> {
    input: R,
    output: W,
    currency: String,
}

/// What the operator chose after filling a step
enum Navigation {
    Forward,
    Back,
    Quit,
}

/// Answer to the review prompt
enum ReviewOutcome {
    Submitted(SubmittedClose),
    Back,
    Cancelled,
}

impl<R: BufRead, W: Write> WizardRunner<R, W> {
    pub fn new(input: R, output: W, currency: impl Into<String>) -> Self {
        Self {
            input,
            output,
            currency: currency.into(),
        }
    }

    /// Drive the wizard until the close is submitted or the operator quits
    pub fn run(
        &mut self,
        wizard: &mut CloseWizard<'_>,
        notifier: &dyn CloseNotifier,
    ) -> CloseResult<Option<SubmittedClose>> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "{}", wizard.step())?;

            let filled = match wizard.step() {
                WizardStep::Setup => self.setup(wizard)?,
                WizardStep::Sales => self.sales(wizard)?,
                WizardStep::Payments => self.payments(wizard)?,
                WizardStep::Expenses => self.expenses(wizard)?,
                WizardStep::Withdrawal => self.withdrawal(wizard)?,
                WizardStep::Count => self.count(wizard)?,
                WizardStep::Review => match self.review(wizard, notifier)? {
                    ReviewOutcome::Submitted(submitted) => return Ok(Some(submitted)),
                    ReviewOutcome::Back => {
                        wizard.previous();
                        continue;
                    }
                    ReviewOutcome::Cancelled => return self.cancelled(),
                },
            };
            if !filled {
                return self.cancelled();
            }

            match self.navigation()? {
                Some(Navigation::Forward) => {
                    if !wizard.next() {
                        writeln!(self.output, "Some required fields are missing.")?;
                    }
                }
                Some(Navigation::Back) => {
                    wizard.previous();
                }
                Some(Navigation::Quit) | None => return self.cancelled(),
            }
        }
    }

    fn setup(&mut self, wizard: &mut CloseWizard<'_>) -> CloseResult<bool> {
        let stores: Vec<_> = wizard.stores().iter().map(|s| (s.id, s.name.clone())).collect();
        if stores.is_empty() {
            writeln!(self.output, "No stores are available to you.")?;
        }
        for (i, (_, name)) in stores.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, name)?;
        }

        let current = wizard
            .selected_store()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "none".into());
        let Some(answer) = self.prompt(&format!("Store number [{}]: ", current))? else {
            return Ok(false);
        };
        if !answer.is_empty() {
            match answer.parse::<usize>().ok().and_then(|n| stores.get(n.wrapping_sub(1))) {
                Some((id, _)) => wizard.set_store(*id)?,
                None => writeln!(self.output, "Unknown store '{}'", answer)?,
            }
        }

        let current = wizard
            .form()
            .date
            .map(|d| d.to_string())
            .unwrap_or_default();
        let Some(answer) = self.prompt(&format!("Date (YYYY-MM-DD) [{}]: ", current))? else {
            return Ok(false);
        };
        if !answer.is_empty() {
            match NaiveDate::parse_from_str(&answer, "%Y-%m-%d") {
                Ok(date) => wizard.set_date(date)?,
                Err(_) => writeln!(self.output, "Invalid date '{}'", answer)?,
            }
        }

        let current = wizard.form().compiler_name.clone();
        let Some(answer) = self.prompt(&format!("Compiler [{}]: ", current))? else {
            return Ok(false);
        };
        if !answer.is_empty() {
            wizard.set_compiler_name(&answer);
        }

        let fund = wizard.form().opening_cash_fund;
        writeln!(self.output, "Opening cash fund: {}", self.money(fund))?;
        Ok(true)
    }

    fn sales(&mut self, wizard: &mut CloseWizard<'_>) -> CloseResult<bool> {
        let current = wizard
            .form()
            .receipt
            .as_ref()
            .map(|r| r.file_name.clone())
            .unwrap_or_else(|| "none".into());
        let Some(answer) = self.prompt(&format!("Receipt image path [{}]: ", current))? else {
            return Ok(false);
        };
        if !answer.is_empty() {
            let path = Path::new(&answer);
            match std::fs::read(path) {
                Ok(bytes) => wizard.attach_receipt(ReceiptAttachment {
                    file_name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| answer.clone()),
                    bytes,
                }),
                Err(e) => writeln!(self.output, "Cannot read '{}': {}", answer, e)?,
            }
        }

        let current = wizard.form().total_sales.clone();
        match self.prompt_amount("Total sales", &current)? {
            Some(value) => wizard.set_total_sales(&value),
            None => return Ok(false),
        }
        Ok(true)
    }

    fn payments(&mut self, wizard: &mut CloseWizard<'_>) -> CloseResult<bool> {
        let rows: Vec<_> = wizard
            .form()
            .payments
            .iter()
            .map(|r| (r.method_id, r.method_name.clone(), r.amount.clone()))
            .collect();

        for (method_id, name, current) in rows {
            match self.prompt_amount(&name, &current)? {
                Some(value) => wizard.set_payment(method_id, &value)?,
                None => return Ok(false),
            }
        }

        for warning in &wizard.derived().warnings {
            writeln!(self.output, "Warning: {}", warning)?;
        }
        Ok(true)
    }

    fn expenses(&mut self, wizard: &mut CloseWizard<'_>) -> CloseResult<bool> {
        for row in &wizard.form().expenses {
            writeln!(self.output, "  - {}: {}", row.description, row.amount)?;
        }

        loop {
            let Some(description) = self.prompt("Expense description (blank to finish): ")? else {
                return Ok(false);
            };
            if description.is_empty() {
                return Ok(true);
            }
            match self.prompt_amount("Amount", "")? {
                Some(amount) => wizard.add_expense(&description, &amount),
                None => return Ok(false),
            }
        }
    }

    fn withdrawal(&mut self, wizard: &mut CloseWizard<'_>) -> CloseResult<bool> {
        let current = wizard.form().bank_withdrawal.clone();
        match self.prompt_amount("Bank withdrawal", &current)? {
            Some(value) => wizard.set_bank_withdrawal(&value),
            None => return Ok(false),
        }
        Ok(true)
    }

    fn count(&mut self, wizard: &mut CloseWizard<'_>) -> CloseResult<bool> {
        let theoretical = wizard.derived().theoretical;
        writeln!(self.output, "Expected cash in drawer: {}", self.money(theoretical))?;

        let current = wizard.form().actual_cash_fund.clone();
        match self.prompt_amount("Counted cash", &current)? {
            Some(value) => wizard.set_actual_cash_fund(&value),
            None => return Ok(false),
        }

        let derived = wizard.derived();
        writeln!(
            self.output,
            "Difference: {} ({})",
            derived.difference.format_signed(),
            derived.status.label()
        )?;

        let current = wizard.form().notes.clone();
        let Some(notes) = self.prompt(&format!("Notes [{}]: ", current))? else {
            return Ok(false);
        };
        if !notes.is_empty() {
            wizard.set_notes(&notes);
        }
        Ok(true)
    }

    fn review(
        &mut self,
        wizard: &mut CloseWizard<'_>,
        notifier: &dyn CloseNotifier,
    ) -> CloseResult<ReviewOutcome> {
        let derived = wizard.derived();
        let form = wizard.form();
        let lines = [
            ("Opening fund", form.opening_cash_fund),
            ("Opening + sales", derived.partial_result),
            ("Non-cash payments", derived.non_cash_total),
            ("Expenses", derived.expenses_total),
            ("Theoretical fund", derived.theoretical),
        ];
        for (label, amount) in lines {
            writeln!(self.output, "{:<20} {}", label, self.money(amount))?;
        }
        writeln!(
            self.output,
            "{:<20} {} ({})",
            "Difference",
            derived.difference.format_signed(),
            derived.status.label()
        )?;
        for warning in &derived.warnings {
            writeln!(self.output, "Warning: {}", warning)?;
        }

        let Some(answer) = self.prompt("Submit this close? (yes/no/back) [no]: ")? else {
            return Ok(ReviewOutcome::Cancelled);
        };
        match answer.to_lowercase().as_str() {
            "y" | "yes" => {
                let submitted = wizard.submit(notifier)?;
                writeln!(
                    self.output,
                    "Close {} saved with status {}",
                    submitted.close.id,
                    submitted.close.status.label()
                )?;
                Ok(ReviewOutcome::Submitted(submitted))
            }
            "b" | "back" => Ok(ReviewOutcome::Back),
            _ => Ok(ReviewOutcome::Cancelled),
        }
    }

    fn navigation(&mut self) -> CloseResult<Option<Navigation>> {
        loop {
            let Some(answer) = self.prompt("[Enter] continue, b back, q quit: ")? else {
                return Ok(None);
            };
            match answer.to_lowercase().as_str() {
                "" => return Ok(Some(Navigation::Forward)),
                "b" => return Ok(Some(Navigation::Back)),
                "q" => return Ok(Some(Navigation::Quit)),
                other => writeln!(self.output, "Unknown choice '{}'", other)?,
            }
        }
    }

    /// Ask for an amount until the answer is blank or parses
    fn prompt_amount(&mut self, label: &str, current: &str) -> CloseResult<Option<String>> {
        loop {
            let Some(answer) = self.prompt(&format!("{} [{}]: ", label, current))? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(current.to_string()));
            }
            match Money::parse(&answer) {
                Ok(_) => return Ok(Some(answer)),
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    /// `None` at end of input
    fn prompt(&mut self, prompt: &str) -> CloseResult<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn cancelled(&mut self) -> CloseResult<Option<SubmittedClose>> {
        writeln!(self.output, "Close cancelled.")?;
        Ok(None)
    }

    fn money(&self, amount: Money) -> String {
        amount.format_with_symbol(&self.currency)
    }
}
