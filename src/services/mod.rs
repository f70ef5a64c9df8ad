//! Service layer for ControlClose
//!
//! Services sit on top of the storage layer and own validation, derived
//! fields and the audit trail for every mutation.

pub mod close;
pub mod company;
pub mod dashboard;
pub mod payment_method;
pub mod profile;
pub mod reconciliation;
pub mod store;

pub use close::{CloseFilter, CloseService, NewClose, ReceiptAttachment, SubmittedClose};
pub use company::CompanyService;
pub use dashboard::{
    DashboardService, DashboardStats, DayStatus, PaymentTotal, StoreFundStatus, WeeklySales,
    YearOverYear,
};
pub use payment_method::{PaymentMethodService, PaymentMethodUpdate};
pub use profile::{ProfileService, ProfileUpdate};
pub use reconciliation::{reconcile, Reconciliation, ReconciliationInput, ReconciliationWarning};
pub use store::{StoreService, StoreUpdate};
