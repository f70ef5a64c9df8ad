//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod audit;
pub mod close;
pub mod company;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod payment;
pub mod store;
pub mod user;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::auth::{Route, Session};
use crate::config::settings::Settings;
use crate::error::{CloseError, CloseResult};
use crate::models::{Money, Profile, StoreId};
use crate::storage::Storage;

pub use audit::{handle_audit_command, AuditArgs};
pub use close::{handle_close_command, CloseCommands};
pub use company::{handle_company_command, CompanyCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use dashboard::{handle_dashboard_command, DashboardCommands};
pub use export::{handle_export_command, ExportCommands};
pub use payment::{handle_payment_command, PaymentCommands};
pub use store::{handle_store_command, StoreCommands};
pub use user::{handle_user_command, UserCommands};

/// Everything a command handler needs
pub struct CliContext<'a> {
    pub storage: &'a Storage,
    pub settings: &'a Settings,
    pub session: Session<'a>,
}

impl<'a> CliContext<'a> {
    /// Without `--as` the local owner runs every command; with it the
    /// signed-in profile must be allowed on `route`
    pub fn authorize(&self, route: Route) -> CloseResult<()> {
        if self.session.current().is_some() {
            self.session.require(route)?;
        }
        Ok(())
    }

    /// The signed-in profile; commands that record closes need one
    pub fn signed_in(&self, route: Route) -> CloseResult<&Profile> {
        if self.session.current().is_none() {
            return Err(CloseError::Unauthorized(
                "sign in with --as <username> to record a close".into(),
            ));
        }
        self.session.require(route)
    }

    pub fn money(&self, amount: Money) -> String {
        amount.format_with_symbol(&self.settings.currency_symbol)
    }
}

pub(crate) fn parse_date(value: &str) -> CloseResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CloseError::Validation(format!("Invalid date '{}'. Use YYYY-MM-DD", value))
    })
}

pub(crate) fn parse_optional_date(value: Option<&str>) -> CloseResult<Option<NaiveDate>> {
    value.map(parse_date).transpose()
}

pub(crate) fn parse_money(label: &str, value: &str) -> CloseResult<Money> {
    Money::parse(value)
        .map_err(|e| CloseError::Validation(format!("Invalid {} '{}': {}", label, value, e)))
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn store_names(storage: &Storage) -> CloseResult<HashMap<StoreId, String>> {
    Ok(storage
        .stores
        .get_all()?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect())
}
