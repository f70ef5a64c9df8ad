//! ControlClose - daily cash-register close reconciliation
//!
//! Each store records one close per day: declared sales, takings by payment
//! method, cash expenses, the bank withdrawal and the counted cash. The
//! theoretical fund is derived from those figures and compared with the
//! count to classify the close as ok, warning or ko.
//!
//! # Architecture
//!
//! - `config`: data directory and settings
//! - `error`: crate error type
//! - `models`: stores, payment methods, closes, profiles, money
//! - `storage`: JSON file repositories and the receipt blob store
//! - `audit`: append-only audit log
//! - `services`: business rules, including reconciliation and the dashboard
//! - `wizard`: the step-by-step close form
//! - `auth`: session and route access rules
//! - `notify`: close summaries for store recipients
//! - `export`: CSV report and full JSON/YAML dumps
//! - `cli`, `display`: command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use controlclose::config::{ControlClosePaths, Settings};
//! use controlclose::storage::Storage;
//!
//! let paths = ControlClosePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod notify;
pub mod services;
pub mod storage;
pub mod wizard;

pub use error::{CloseError, CloseResult};
