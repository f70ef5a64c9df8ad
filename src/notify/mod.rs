//! Close notifications
//!
//! After a close is stored, a short summary goes to the store's recipients.
//! Delivery is best-effort: a failing notifier is logged by the caller and
//! never undoes the close.

pub mod outbox;
pub mod summary;

pub use outbox::OutboxNotifier;
pub use summary::{CloseMessage, CloseSummary};

use crate::error::CloseResult;

/// Delivery channel for close summaries
pub trait CloseNotifier {
    fn notify(&self, message: &CloseMessage) -> CloseResult<()>;
}

/// Notifier that drops every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl CloseNotifier for NoopNotifier {
    fn notify(&self, _message: &CloseMessage) -> CloseResult<()> {
        Ok(())
    }
}
