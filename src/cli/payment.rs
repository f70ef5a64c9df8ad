//! Payment method CLI commands

use clap::Subcommand;

use crate::auth::Route;
use crate::display::format_payment_method_list;
use crate::error::CloseResult;
use crate::services::{PaymentMethodService, PaymentMethodUpdate};

use super::CliContext;

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Add a payment method
    Create {
        name: String,
        /// Money goes into the drawer (cash)
        #[arg(long)]
        cash: bool,
    },
    /// List payment methods, cash first
    List {
        /// Include inactive methods
        #[arg(short, long)]
        all: bool,
    },
    /// Edit a payment method
    Edit {
        /// Method name or ID
        method: String,
        #[arg(short, long)]
        name: Option<String>,
        /// Whether the method counts as cash
        #[arg(long)]
        cash: Option<bool>,
        /// Whether the method is offered in new closes
        #[arg(long)]
        active: Option<bool>,
    },
}

pub fn handle_payment_command(ctx: &CliContext, cmd: PaymentCommands) -> CloseResult<()> {
    let service = PaymentMethodService::new(ctx.storage);

    match cmd {
        PaymentCommands::List { all } => {
            println!("{}", format_payment_method_list(&service.list(all)?));
        }
        PaymentCommands::Create { name, cash } => {
            ctx.authorize(Route::Admin)?;
            let method = service.create(&name, cash)?;
            println!("Created payment method: {}", method);
            println!("  ID: {}", method.id);
        }
        PaymentCommands::Edit {
            method,
            name,
            cash,
            active,
        } => {
            ctx.authorize(Route::Admin)?;
            let found = service.resolve(&method)?;
            if name.is_none() && cash.is_none() && active.is_none() {
                println!("No changes specified. Use --name, --cash or --active.");
                return Ok(());
            }

            let updated = service.update(
                found.id,
                PaymentMethodUpdate {
                    name,
                    is_cash: cash,
                    active,
                },
            )?;
            println!("Updated payment method: {}", updated);
        }
    }

    Ok(())
}
