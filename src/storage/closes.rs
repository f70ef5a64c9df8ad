//! Cash close repository for JSON storage
//!
//! A close is stored together with its payments and expenses, so header and
//! rows are always written in the same file replacement. `create` is the
//! single atomic entry point used by submission: it either persists the whole
//! close or leaves both memory and disk untouched.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::{CloseError, CloseResult};
use crate::models::{CashClose, CashCloseId, StoreId};

use super::file_io::{lock_error, read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CloseData {
    closes: Vec<CashClose>,
}

/// Newest first: by date, then by creation time
fn newest_first(closes: &mut [CashClose]) {
    closes.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Repository for cash close persistence
pub struct CloseRepository {
    path: PathBuf,
    data: RwLock<HashMap<CashCloseId, CashClose>>,
}

impl CloseRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> CloseResult<()> {
        let file_data: CloseData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_error)?;
        data.clear();
        for close in file_data.closes {
            data.insert(close.id, close);
        }

        Ok(())
    }

    pub fn save(&self) -> CloseResult<()> {
        let data = self.data.read().map_err(lock_error)?;
        self.persist(&data)
    }

    fn persist(&self, data: &HashMap<CashCloseId, CashClose>) -> CloseResult<()> {
        let mut closes: Vec<_> = data.values().cloned().collect();
        newest_first(&mut closes);
        write_json_atomic(&self.path, &CloseData { closes })
    }

    /// Insert a complete close and write it to disk in one step
    ///
    /// With `enforce_unique` set, a second close for the same store and date
    /// is rejected with a `Duplicate` error.
    pub fn create(&self, close: CashClose, enforce_unique: bool) -> CloseResult<()> {
        let mut data = self.data.write().map_err(lock_error)?;

        if data.contains_key(&close.id) {
            return Err(CloseError::Duplicate {
                entity_type: "Cash close",
                identifier: close.id.to_string(),
            });
        }

        if enforce_unique
            && data
                .values()
                .any(|c| c.store_id == close.store_id && c.date == close.date)
        {
            return Err(CloseError::Duplicate {
                entity_type: "Cash close",
                identifier: format!("store {} on {}", close.store_id, close.date),
            });
        }

        let id = close.id;
        data.insert(id, close);

        if let Err(e) = self.persist(&data) {
            data.remove(&id);
            return Err(e);
        }

        Ok(())
    }

    pub fn get(&self, id: CashCloseId) -> CloseResult<Option<CashClose>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// Get all closes, newest first
    pub fn get_all(&self) -> CloseResult<Vec<CashClose>> {
        let data = self.data.read().map_err(lock_error)?;

        let mut closes: Vec<_> = data.values().cloned().collect();
        newest_first(&mut closes);
        Ok(closes)
    }

    pub fn get_by_store(&self, store_id: StoreId) -> CloseResult<Vec<CashClose>> {
        let data = self.data.read().map_err(lock_error)?;

        let mut closes: Vec<_> = data
            .values()
            .filter(|c| c.store_id == store_id)
            .cloned()
            .collect();
        newest_first(&mut closes);
        Ok(closes)
    }

    /// Get closes in an inclusive date range, newest first
    pub fn get_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> CloseResult<Vec<CashClose>> {
        let data = self.data.read().map_err(lock_error)?;

        let mut closes: Vec<_> = data
            .values()
            .filter(|c| c.date >= start && c.date <= end)
            .cloned()
            .collect();
        newest_first(&mut closes);
        Ok(closes)
    }

    /// Most recent close for a store strictly before the given date
    pub fn latest_before(&self, store_id: StoreId, date: NaiveDate) -> CloseResult<Option<CashClose>> {
        let data = self.data.read().map_err(lock_error)?;

        Ok(data
            .values()
            .filter(|c| c.store_id == store_id && c.date < date)
            .max_by(|a, b| {
                a.date
                    .cmp(&b.date)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            })
            .cloned())
    }

    pub fn count(&self) -> CloseResult<usize> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.len())
    }
}
