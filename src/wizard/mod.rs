//! Close wizard
//!
//! A linear seven-step controller over one shared form record, plus a
//! terminal runner that drives it from standard input.

pub mod form;
pub mod machine;
pub mod runner;
pub mod step;

pub use form::{CloseForm, ExpenseRow, PaymentRow};
pub use machine::CloseWizard;
pub use runner::WizardRunner;
pub use step::WizardStep;
