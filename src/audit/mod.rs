//! Audit trail for ControlClose
//!
//! Every create, update and delete of a store, payment method, cash close,
//! profile or the company settings is appended to `audit.log` as one JSON
//! line holding the before/after snapshots and a short field diff.
//!
//! ```rust,ignore
//! use controlclose::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::create(EntityType::Store, store.id.to_string(), Some(store.name.clone()), &store))?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::{AuditFilter, AuditLogger};
