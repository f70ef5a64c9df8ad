//! Outbox notifier
//!
//! Appends each rendered message to `outbox.log` (one JSON line per message)
//! for a mail relay to pick up, and traces the delivery.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CloseError, CloseResult};

use super::{CloseMessage, CloseNotifier};

/// One queued message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub queued_at: DateTime<Utc>,
    #[serde(flatten)]
    pub message: CloseMessage,
}

pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read back every queued message, oldest first
    pub fn read_all(&self) -> CloseResult<Vec<OutboxRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| CloseError::Notification(format!("Failed to read outbox: {}", e)))?;

        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(CloseError::from))
            .collect()
    }
}

impl CloseNotifier for OutboxNotifier {
    fn notify(&self, message: &CloseMessage) -> CloseResult<()> {
        if message.recipients.is_empty() {
            return Err(CloseError::Notification("No recipients".into()));
        }

        let record = OutboxRecord {
            queued_at: Utc::now(),
            message: message.clone(),
        };
        let line = serde_json::to_string(&record)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CloseError::Notification(format!("Failed to open outbox: {}", e)))?;
        writeln!(file, "{}", line)
            .map_err(|e| CloseError::Notification(format!("Failed to queue message: {}", e)))?;

        info!(
            to = %message.recipients.join(", "),
            subject = %message.subject,
            "close summary queued"
        );
        Ok(())
    }
}
