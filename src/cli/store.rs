//! Store CLI commands

use clap::Subcommand;

use crate::auth::Route;
use crate::display::{format_store_details, format_store_list};
use crate::error::CloseResult;
use crate::models::Money;
use crate::services::{StoreService, StoreUpdate};

use super::{parse_money, CliContext};

#[derive(Subcommand)]
pub enum StoreCommands {
    /// Create a new store
    Create {
        /// Store name
        name: String,
        /// Opening cash fund used before the first close (e.g. "150.00")
        #[arg(short, long, default_value = "0")]
        fund: String,
        /// Comma-separated recipients of close summaries
        #[arg(short, long)]
        emails: Option<String>,
    },
    /// List stores
    List {
        /// Include inactive stores
        #[arg(short, long)]
        all: bool,
    },
    /// Show store details
    Show {
        /// Store name or ID
        store: String,
    },
    /// Edit a store
    Edit {
        /// Store name or ID
        store: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        fund: Option<String>,
        /// Pass "" to remove every recipient
        #[arg(short, long)]
        emails: Option<String>,
    },
    /// Allow new closes for a store
    Activate { store: String },
    /// Stop new closes for a store, keeping its history
    Deactivate { store: String },
}

pub fn handle_store_command(ctx: &CliContext, cmd: StoreCommands) -> CloseResult<()> {
    let service = StoreService::new(ctx.storage);

    if !matches!(cmd, StoreCommands::List { .. } | StoreCommands::Show { .. }) {
        ctx.authorize(Route::Admin)?;
    }

    match cmd {
        StoreCommands::Create { name, fund, emails } => {
            let fund = parse_money("opening fund", &fund)?;
            let store = service.create(&name, fund, emails.as_deref())?;
            println!("Created store: {}", store.name);
            println!("  Opening Fund: {}", ctx.money(store.opening_cash_fund));
            println!("  ID: {}", store.id);
        }
        StoreCommands::Edit {
            store,
            name,
            fund,
            emails,
        } => {
            let found = service.resolve(&store)?;
            if name.is_none() && fund.is_none() && emails.is_none() {
                println!("No changes specified. Use --name, --fund or --emails.");
                return Ok(());
            }

            let opening_cash_fund: Option<Money> = fund
                .as_deref()
                .map(|f| parse_money("opening fund", f))
                .transpose()?;
            let updated = service.update(
                found.id,
                StoreUpdate {
                    name,
                    opening_cash_fund,
                    email_destinations: emails,
                    active: None,
                },
            )?;
            println!("Updated store: {}", updated.name);
        }
        StoreCommands::Activate { store } => {
            let found = service.resolve(&store)?;
            let updated = service.set_active(found.id, true)?;
            println!("Activated store: {}", updated.name);
        }
        StoreCommands::Deactivate { store } => {
            let found = service.resolve(&store)?;
            let updated = service.set_active(found.id, false)?;
            println!("Deactivated store: {}", updated.name);
        }
        StoreCommands::List { all } => {
            let stores = service.list(all)?;
            println!("{}", format_store_list(&stores, &ctx.settings.currency_symbol));
        }
        StoreCommands::Show { store } => {
            let found = service.resolve(&store)?;
            print!("{}", format_store_details(&found, &ctx.settings.currency_symbol));
        }
    }

    Ok(())
}
