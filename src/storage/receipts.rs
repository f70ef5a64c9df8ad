//! Receipt blob store
//!
//! Receipt photos are kept as plain files under `<base>/receipts/`. Each
//! upload gets a content path of the form
//! `sales-receipts/<millis>_<clean name>`, which is what a close records.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::error::{CloseError, CloseResult};

/// Folder prefix of every receipt content path
pub const RECEIPT_PREFIX: &str = "sales-receipts";

/// Lowercase the file name, turn whitespace into `_` and drop anything that
/// is not alphanumeric, `.`, `_` or `-`
pub fn clean_file_name(name: &str) -> String {
    let base = Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("receipt");

    let cleaned: String = base
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "receipt".to_string()
    } else {
        cleaned
    }
}

/// File-backed blob store for receipt images
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    root: PathBuf,
}

impl ReceiptStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Store an image and return its content path
    pub fn put(&self, file_name: &str, bytes: &[u8]) -> CloseResult<String> {
        let content_path = format!(
            "{}/{}_{}",
            RECEIPT_PREFIX,
            Utc::now().timestamp_millis(),
            clean_file_name(file_name)
        );
        let target = self.resolve(&content_path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CloseError::Blob(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        if target.exists() {
            return Err(CloseError::Blob(format!("Receipt already exists: {}", content_path)));
        }
        fs::write(&target, bytes)
            .map_err(|e| CloseError::Blob(format!("Failed to write {}: {}", content_path, e)))?;

        debug!(path = %content_path, size = bytes.len(), "receipt stored");
        Ok(content_path)
    }

    /// Remove a stored image
    pub fn delete(&self, content_path: &str) -> CloseResult<()> {
        let target = self.resolve(content_path)?;
        fs::remove_file(&target)
            .map_err(|e| CloseError::Blob(format!("Failed to delete {}: {}", content_path, e)))?;
        debug!(path = %content_path, "receipt deleted");
        Ok(())
    }

    pub fn exists(&self, content_path: &str) -> bool {
        self.resolve(content_path).map(|p| p.is_file()).unwrap_or(false)
    }

    pub fn read(&self, content_path: &str) -> CloseResult<Vec<u8>> {
        let target = self.resolve(content_path)?;
        fs::read(&target)
            .map_err(|e| CloseError::Blob(format!("Failed to read {}: {}", content_path, e)))
    }

    /// Local file location of a content path
    ///
    /// Only relative paths made of plain components are accepted.
    pub fn resolve(&self, content_path: &str) -> CloseResult<PathBuf> {
        let relative = Path::new(content_path);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if content_path.is_empty() || !plain {
            return Err(CloseError::Blob(format!("Invalid receipt path: {}", content_path)));
        }

        Ok(self.root.join(relative))
    }

    /// Number of stored receipts
    pub fn count(&self) -> CloseResult<usize> {
        let dir = self.root.join(RECEIPT_PREFIX);
        if !dir.exists() {
            return Ok(0);
        }
        let entries = fs::read_dir(&dir)
            .map_err(|e| CloseError::Blob(format!("Failed to list {}: {}", dir.display(), e)))?;
        Ok(entries.filter_map(Result::ok).filter(|e| e.path().is_file()).count())
    }
}
