//! User (profile) CLI commands

use std::collections::BTreeSet;

use clap::Subcommand;

use crate::auth::Route;
use crate::display::{format_profile_list, format_store_list};
use crate::error::{CloseError, CloseResult};
use crate::models::{Role, StoreId};
use crate::services::{ProfileService, ProfileUpdate, StoreService};
use crate::storage::Storage;

use super::{store_names, CliContext};

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user
    Create {
        username: String,
        /// operatore, admin or superadmin
        #[arg(short, long, default_value = "operatore")]
        role: String,
        #[arg(short, long)]
        email: Option<String>,
        /// Comma-separated stores the user may close
        #[arg(short, long)]
        stores: Option<String>,
    },
    /// List users
    List,
    /// Edit a user
    Edit {
        /// Username or ID
        user: String,
        #[arg(long)]
        username: Option<String>,
        /// Pass "" to clear the email
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        role: Option<String>,
        /// Replace the assigned stores (comma-separated, "" for none)
        #[arg(short, long)]
        stores: Option<String>,
        #[arg(long, conflicts_with = "unblock")]
        block: bool,
        #[arg(long)]
        unblock: bool,
    },
    /// Set the store preselected in new closes ("none" clears it)
    DefaultStore { user: String, store: String },
    /// Mark the user's email as confirmed
    Confirm { user: String },
    /// Delete a user
    Delete { user: String },
    /// Stores the user can record closes for
    Stores { user: String },
}

pub fn handle_user_command(ctx: &CliContext, cmd: UserCommands) -> CloseResult<()> {
    ctx.authorize(Route::Admin)?;
    let service = ProfileService::new(ctx.storage);

    match cmd {
        UserCommands::Create {
            username,
            role,
            email,
            stores,
        } => {
            let role = parse_role(&role)?;
            let stores = parse_stores(ctx.storage, stores.as_deref().unwrap_or_default())?;
            let profile = service.create(&username, role, email.as_deref(), stores)?;
            println!("Created user: {} ({})", profile.username, profile.role);
            println!("  ID: {}", profile.id);
        }
        UserCommands::List => {
            let profiles = service.list()?;
            println!("{}", format_profile_list(&profiles, &store_names(ctx.storage)?));
        }
        UserCommands::Edit {
            user,
            username,
            email,
            role,
            stores,
            block,
            unblock,
        } => {
            let found = service.resolve(&user)?;
            let blocked = match (block, unblock) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            if username.is_none()
                && email.is_none()
                && role.is_none()
                && stores.is_none()
                && blocked.is_none()
            {
                println!("No changes specified. Use --username, --email, --role, --stores or --block.");
                return Ok(());
            }

            let changes = ProfileUpdate {
                username,
                email,
                role: role.as_deref().map(parse_role).transpose()?,
                blocked,
                allowed_stores: stores
                    .as_deref()
                    .map(|s| parse_stores(ctx.storage, s))
                    .transpose()?,
            };
            let updated = service.update(found.id, changes)?;
            println!("Updated user: {}", updated.username);
        }
        UserCommands::DefaultStore { user, store } => {
            let found = service.resolve(&user)?;
            let store_id = if store.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(StoreService::new(ctx.storage).resolve(&store)?.id)
            };
            let updated = service.set_default_store(found.id, store_id)?;
            match store_id {
                Some(_) => println!("Default store set for {}", updated.username),
                None => println!("Default store cleared for {}", updated.username),
            }
        }
        UserCommands::Confirm { user } => {
            let found = service.resolve(&user)?;
            let updated = service.confirm_email(found.id)?;
            println!("Email confirmed for {}", updated.username);
        }
        UserCommands::Delete { user } => {
            let found = service.resolve(&user)?;
            if ctx.session.current().is_some_and(|p| p.id == found.id) {
                return Err(CloseError::Validation(
                    "Cannot delete the signed-in user".into(),
                ));
            }
            service.delete(found.id)?;
            println!("Deleted user: {}", found.username);
        }
        UserCommands::Stores { user } => {
            let found = service.resolve(&user)?;
            let stores = service.available_stores(&found)?;
            println!(
                "{}",
                format_store_list(&stores, &ctx.settings.currency_symbol)
            );
        }
    }

    Ok(())
}

fn parse_role(value: &str) -> CloseResult<Role> {
    Role::parse(value).ok_or_else(|| {
        CloseError::Validation(format!(
            "Invalid role '{}'. Use operatore, admin or superadmin",
            value
        ))
    })
}

fn parse_stores(storage: &Storage, value: &str) -> CloseResult<BTreeSet<StoreId>> {
    let service = StoreService::new(storage);
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| service.resolve(s).map(|store| store.id))
        .collect()
}
