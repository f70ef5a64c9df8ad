//! Append-only JSONL audit logger

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{CloseError, CloseResult};

use super::entry::{AuditEntry, EntityType};

/// Selection applied when reading the log back
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    /// Keep only the last N matching entries
    pub limit: Option<usize>,
}

impl AuditFilter {
    fn matches(&self, entry: &AuditEntry) -> bool {
        self.entity_type.map_or(true, |t| entry.entity_type == t)
            && self
                .entity_id
                .as_deref()
                .map_or(true, |id| entry.entity_id == id)
    }
}

/// Writes audit entries to the audit log, one JSON object per line
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one entry and flush it
    pub fn log(&self, entry: &AuditEntry) -> CloseResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| CloseError::Io(format!("Failed to open audit log: {}", e)))?;

        let json = serde_json::to_string(entry)
            .map_err(|e| CloseError::Json(format!("Failed to serialize audit entry: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| CloseError::Io(format!("Failed to write audit entry: {}", e)))?;

        file.flush()
            .map_err(|e| CloseError::Io(format!("Failed to flush audit log: {}", e)))
    }

    /// Read all entries, oldest first
    pub fn read_all(&self) -> CloseResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| CloseError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                CloseError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                CloseError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read the entries matching a filter, oldest first
    pub fn query(&self, filter: &AuditFilter) -> CloseResult<Vec<AuditEntry>> {
        let mut entries: Vec<_> = self
            .read_all()?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();

        if let Some(limit) = filter.limit {
            let start = entries.len().saturating_sub(limit);
            entries.drain(..start);
        }

        Ok(entries)
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}
