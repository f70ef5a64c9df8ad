//! Core data models for ControlClose
//!
//! Stores, payment methods, cash closes and user profiles, plus the money and
//! id primitives they are built from.

pub mod cash_close;
pub mod company;
pub mod ids;
pub mod money;
pub mod payment_method;
pub mod profile;
pub mod store;

pub use cash_close::{CashClose, CashCloseExpense, CashClosePayment, CloseStatus, WARNING_THRESHOLD};
pub use company::CompanySettings;
pub use ids::{CashCloseId, PaymentMethodId, ProfileId, StoreId};
pub use money::{Money, MoneyParseError};
pub use payment_method::PaymentMethod;
pub use profile::{Profile, Role};
pub use store::{Store, StoreValidationError};
