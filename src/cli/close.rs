//! Cash close CLI commands
//!
//! `close new` walks the wizard interactively; `close add` feeds the same
//! wizard from flags, so both paths pass the same step gates.

use std::io;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::auth::Route;
use crate::display::{format_close_details, format_close_list};
use crate::error::{CloseError, CloseResult};
use crate::models::{CloseStatus, StoreId};
use crate::notify::OutboxNotifier;
use crate::services::{
    CloseFilter, CloseService, PaymentMethodService, ReceiptAttachment, StoreService, SubmittedClose,
};
use crate::wizard::{CloseWizard, WizardRunner};

use super::{parse_date, parse_optional_date, store_names, today, CliContext};

#[derive(Subcommand)]
pub enum CloseCommands {
    /// Record a close step by step
    New {
        /// Close date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Record a close in one command
    Add {
        /// Store name or ID; defaults to the user's store
        #[arg(short, long)]
        store: Option<String>,
        /// Close date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Compiler name, defaults to the username
        #[arg(long)]
        compiler: Option<String>,
        /// Photo of the register's daily receipt
        #[arg(long)]
        receipt: PathBuf,
        /// Total sales declared by the register
        #[arg(long)]
        sales: String,
        /// Amount taken with a method, e.g. "POS=120.50" (repeatable)
        #[arg(short, long = "payment", value_name = "METHOD=AMOUNT")]
        payments: Vec<String>,
        /// Expense paid from the drawer, e.g. "milk=3.20" (repeatable)
        #[arg(short = 'x', long = "expense", value_name = "DESCRIPTION=AMOUNT")]
        expenses: Vec<String>,
        /// Cash taken to the bank
        #[arg(short, long)]
        withdrawal: Option<String>,
        /// Counted cash left in the drawer
        #[arg(short, long)]
        count: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List closes, newest first
    List {
        #[arg(short, long)]
        store: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// ok, warning or ko
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one close in full
    Show {
        /// Close ID
        close: String,
    },
    /// Save the receipt photo of a close to a file
    Receipt {
        /// Close ID
        close: String,
        output: PathBuf,
    },
    /// Cash fund a store opens with on a date
    OpeningFund {
        /// Store name or ID
        store: String,
        #[arg(short, long)]
        date: Option<String>,
    },
}

pub fn handle_close_command(ctx: &CliContext, cmd: CloseCommands) -> CloseResult<()> {
    let notifier = OutboxNotifier::new(ctx.storage.paths().outbox_file());

    match cmd {
        CloseCommands::New { date } => {
            let date = parse_optional_date(date.as_deref())?.unwrap_or_else(today);
            let profile = ctx.signed_in(Route::NewClose)?.clone();
            let mut wizard = CloseWizard::start(ctx.storage, ctx.settings, &profile, date)?;

            let stdin = io::stdin();
            let mut runner =
                WizardRunner::new(stdin.lock(), io::stdout(), ctx.settings.currency_symbol.clone());
            if let Some(submitted) = runner.run(&mut wizard, &notifier)? {
                report_submission(ctx, &submitted);
            }
        }

        CloseCommands::Add {
            store,
            date,
            compiler,
            receipt,
            sales,
            payments,
            expenses,
            withdrawal,
            count,
            notes,
        } => {
            let date = parse_optional_date(date.as_deref())?.unwrap_or_else(today);
            let profile = ctx.signed_in(Route::NewClose)?.clone();
            let mut wizard = CloseWizard::start(ctx.storage, ctx.settings, &profile, date)?;

            if let Some(store) = store {
                let found = StoreService::new(ctx.storage).resolve(&store)?;
                wizard.set_store(found.id)?;
            }
            if let Some(compiler) = compiler {
                wizard.set_compiler_name(&compiler);
            }
            advance(&mut wizard)?;

            wizard.attach_receipt(read_receipt(&receipt)?);
            wizard.set_total_sales(&sales);
            advance(&mut wizard)?;

            let methods = PaymentMethodService::new(ctx.storage);
            for entry in &payments {
                let (method, amount) = split_pair(entry)?;
                wizard.set_payment(methods.resolve(method)?.id, amount)?;
            }
            advance(&mut wizard)?;

            for entry in &expenses {
                let (description, amount) = split_pair(entry)?;
                wizard.add_expense(description, amount);
            }
            advance(&mut wizard)?;

            wizard.set_bank_withdrawal(withdrawal.as_deref().unwrap_or_default());
            advance(&mut wizard)?;

            wizard.set_actual_cash_fund(count.as_deref().unwrap_or_default());
            if let Some(notes) = notes {
                wizard.set_notes(&notes);
            }
            advance(&mut wizard)?;

            for warning in &wizard.derived().warnings {
                eprintln!("Warning: {}", warning);
            }
            let submitted = wizard.submit(&notifier)?;
            report_submission(ctx, &submitted);
        }

        CloseCommands::List {
            store,
            date,
            from,
            to,
            status,
        } => {
            ctx.authorize(Route::NewClose)?;
            let store_id = match store {
                Some(s) => Some(StoreService::new(ctx.storage).resolve(&s)?.id),
                None => None,
            };
            let status = status
                .map(|s| {
                    CloseStatus::parse(&s).ok_or_else(|| {
                        CloseError::Validation(format!(
                            "Invalid status '{}'. Use ok, warning or ko",
                            s
                        ))
                    })
                })
                .transpose()?;

            let filter = CloseFilter {
                store_id,
                date: parse_optional_date(date.as_deref())?,
                start: parse_optional_date(from.as_deref())?,
                end: parse_optional_date(to.as_deref())?,
                status,
            };

            let mut closes = CloseService::new(ctx.storage, ctx.settings).list(&filter)?;
            if let Some(profile) = ctx.session.current() {
                closes.retain(|c| profile.can_use_store(c.store_id));
            }
            println!("{}", format_close_list(&closes, &store_names(ctx.storage)?));
        }

        CloseCommands::Show { close } => {
            ctx.authorize(Route::NewClose)?;
            let found = CloseService::new(ctx.storage, ctx.settings).resolve(&close)?;
            ensure_visible(ctx, found.store_id)?;

            let store_name = store_names(ctx.storage)?
                .remove(&found.store_id)
                .unwrap_or_else(|| found.store_id.to_string());
            let methods = ctx.storage.payment_methods.get_all()?;
            print!(
                "{}",
                format_close_details(&found, &store_name, &methods, &ctx.settings.currency_symbol)
            );
        }

        CloseCommands::Receipt { close, output } => {
            ctx.authorize(Route::NewClose)?;
            let found = CloseService::new(ctx.storage, ctx.settings).resolve(&close)?;
            ensure_visible(ctx, found.store_id)?;

            let content_path = found.receipt_image.as_deref().ok_or_else(|| CloseError::NotFound {
                entity_type: "Receipt",
                identifier: found.id.to_string(),
            })?;
            let bytes = ctx.storage.receipts.read(content_path)?;
            std::fs::write(&output, &bytes).map_err(|e| {
                CloseError::Blob(format!("Cannot write {}: {}", output.display(), e))
            })?;
            println!("Receipt of {} saved to: {}", found.id, output.display());
        }

        CloseCommands::OpeningFund { store, date } => {
            ctx.authorize(Route::NewClose)?;
            let store = StoreService::new(ctx.storage).resolve(&store)?;
            ensure_visible(ctx, store.id)?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => today(),
            };
            let fund = CloseService::new(ctx.storage, ctx.settings).opening_fund(store.id, date)?;
            println!("{} opens {} with {}", store.name, date, ctx.money(fund));
        }
    }

    Ok(())
}

/// Without `--as` every store is visible
fn ensure_visible(ctx: &CliContext, store_id: StoreId) -> CloseResult<()> {
    match ctx.session.current() {
        Some(profile) if !profile.can_use_store(store_id) => Err(CloseError::Unauthorized(format!(
            "{} cannot see closes of this store",
            profile.username
        ))),
        _ => Ok(()),
    }
}

fn advance(wizard: &mut CloseWizard<'_>) -> CloseResult<()> {
    let step = wizard.step();
    if wizard.next() {
        Ok(())
    } else {
        Err(CloseError::Validation(format!(
            "{} is incomplete",
            step.title()
        )))
    }
}

fn split_pair(entry: &str) -> CloseResult<(&str, &str)> {
    entry
        .rsplit_once('=')
        .map(|(name, amount)| (name.trim(), amount.trim()))
        .ok_or_else(|| {
            CloseError::Validation(format!("Expected NAME=AMOUNT, got '{}'", entry))
        })
}

fn read_receipt(path: &Path) -> CloseResult<ReceiptAttachment> {
    let bytes = std::fs::read(path).map_err(|e| {
        CloseError::Blob(format!("Cannot read receipt {}: {}", path.display(), e))
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "receipt".to_string());
    Ok(ReceiptAttachment { file_name, bytes })
}

fn report_submission(ctx: &CliContext, submitted: &SubmittedClose) {
    let close = &submitted.close;
    println!("Close saved: {}", close.id);
    println!("  Theoretical fund: {}", ctx.money(close.theoretical_cash_fund));
    println!("  Actual fund:      {}", ctx.money(close.actual_cash_fund));
    println!(
        "  Difference:       {} ({})",
        close.difference.format_signed(),
        close.status.label()
    );
    if submitted.notified {
        println!("  Summary queued for the store's recipients");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("POS = 120,50").unwrap(), ("POS", "120,50"));
        assert_eq!(split_pair("a=b=3").unwrap(), ("a=b", "3"));
        assert!(split_pair("POS 120").unwrap_err().is_validation());
    }
}
