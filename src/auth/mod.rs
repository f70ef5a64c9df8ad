//! Sessions and route access

pub mod access;
pub mod session;

pub use access::{can_access, landing, redirect_for, Route};
pub use session::{AuthEvent, Session, Subscription};
