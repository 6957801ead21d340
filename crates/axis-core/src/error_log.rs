//! Bounded diagnostic log of recent runtime errors.
//!
//! Entries are kept newest-first and capped at [`MAX_ENTRIES`]; the log is
//! independent of the session store and exported only on request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::new_id;
use crate::storage::{StateStorage, ERROR_LOG_KEY};

pub const MAX_ENTRIES: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub time: DateTime<Utc>,
}

impl ErrorLogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            message: message.into(),
            source: None,
            stack: None,
            time: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

pub struct ErrorLog<S: StateStorage> {
    storage: S,
    limit: usize,
}

impl<S: StateStorage> ErrorLog<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            limit: MAX_ENTRIES,
        }
    }

    /// Lower the cap. Values are clamped to `1..=MAX_ENTRIES`.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_ENTRIES);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// All entries, newest first. Unreadable logs read as empty.
    pub fn read(&self) -> Vec<ErrorLogEntry> {
        match self.storage.load(ERROR_LOG_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::debug!(error = %e, "error log unreadable");
                Vec::new()
            }
        }
    }

    /// Prepend an entry, dropping the oldest beyond the limit.
    ///
    /// Write failures are ignored; the log is diagnostic only.
    pub fn append(&self, entry: ErrorLogEntry) {
        let mut entries = self.read();
        entries.insert(0, entry);
        entries.truncate(self.limit);
        self.write(&entries);
    }

    pub fn clear(&self) {
        self.write(&[]);
    }

    /// Pretty JSON for a user-initiated export.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.read())?)
    }

    fn write(&self, entries: &[ErrorLogEntry]) {
        let result = serde_json::to_string(entries)
            .map_err(crate::error::CoreError::from)
            .and_then(|json| Ok(self.storage.save(ERROR_LOG_KEY, &json)?));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write error log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn limit_is_clamped_to_the_cap() {
        assert_eq!(ErrorLog::new(MemoryStorage::new()).with_limit(5000).limit(), MAX_ENTRIES);
        assert_eq!(ErrorLog::new(MemoryStorage::new()).with_limit(0).limit(), 1);

        let log = ErrorLog::new(MemoryStorage::new()).with_limit(0);
        log.append(ErrorLogEntry::new("kept"));
        assert_eq!(log.read().len(), 1);

        let log = ErrorLog::new(MemoryStorage::new()).with_limit(5000);
        for i in 0..MAX_ENTRIES + 5 {
            log.append(ErrorLogEntry::new(format!("e{i}")));
        }
        assert_eq!(log.read().len(), MAX_ENTRIES);
    }

    #[test]
    fn keeps_newest_first() {
        let log = ErrorLog::new(MemoryStorage::new());
        log.append(ErrorLogEntry::new("first"));
        log.append(ErrorLogEntry::new("second").with_source("cli"));
        let entries = log.read();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "second");
        assert_eq!(entries[0].source.as_deref(), Some("cli"));
        assert_eq!(entries[1].message, "first");
    }

    #[test]
    fn caps_at_limit() {
        let log = ErrorLog::new(MemoryStorage::new());
        for i in 0..(MAX_ENTRIES + 5) {
            log.append(ErrorLogEntry::new(format!("err {i}")));
        }
        let entries = log.read();
        assert_eq!(entries.len(), MAX_ENTRIES);
        assert_eq!(entries[0].message, format!("err {}", MAX_ENTRIES + 4));
    }

    #[test]
    fn clear_and_corrupt_blob_read_empty() {
        let storage = MemoryStorage::new();
        let log = ErrorLog::new(storage.clone());
        log.append(ErrorLogEntry::new("boom"));
        log.clear();
        assert!(log.read().is_empty());

        storage.save(ERROR_LOG_KEY, "not json").unwrap();
        assert!(log.read().is_empty());
    }

    #[test]
    fn swallows_write_failures() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let log = ErrorLog::new(storage).with_limit(3);
        log.append(ErrorLogEntry::new("lost"));
        assert!(log.read().is_empty());
    }
}
