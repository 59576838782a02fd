// src/infrastructure/ledger.rs
// JSON file recording submissions that still need their sheet write-back

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::repository::{LedgerEntry, SubmissionLedger};

pub struct JsonFileLedger {
    path: PathBuf,
    entries: Mutex<HashMap<String, LedgerEntry>>,
}

impl JsonFileLedger {
    /// Open the ledger, starting empty when the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| LedgerError::Io(format!("{}: {}", path.display(), e)))?;
            if contents.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| LedgerError::Format(e.to_string()))?
            }
        } else {
            HashMap::new()
        };

        if !entries.is_empty() {
            log::warn!(
                "Submission ledger {} holds {} order(s) awaiting sheet update",
                path.display(),
                entries.len()
            );
        }

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, entries: &HashMap<String, LedgerEntry>) -> LedgerResult<()> {
        let contents =
            serde_json::to_string_pretty(entries).map_err(|e| LedgerError::Format(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents).map_err(|e| LedgerError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| LedgerError::Io(e.to_string()))
    }
}

impl SubmissionLedger for JsonFileLedger {
    fn lookup(&self, key: &str) -> LedgerResult<Option<LedgerEntry>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Io("ledger lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn record(&self, key: &str, entry: LedgerEntry) -> LedgerResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Io("ledger lock poisoned".to_string()))?;
        entries.insert(key.to_string(), entry);
        self.persist(&entries)
    }

    fn clear(&self, key: &str) -> LedgerResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Io("ledger lock poisoned".to_string()))?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry() -> LedgerEntry {
        LedgerEntry {
            order_id: "151220000000000".to_string(),
            limit_price: Some(dec!(500.0)),
            submitted_at: "2026-10-18 09:15:00".to_string(),
            prior_status: String::new(),
        }
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let ledger = JsonFileLedger::open(&path).unwrap();
        assert!(ledger.is_empty());
        ledger.record("2|SBIN|BUY|10", entry()).unwrap();
        drop(ledger);

        let reopened = JsonFileLedger::open(&path).unwrap();
        assert_eq!(reopened.lookup("2|SBIN|BUY|10").unwrap(), Some(entry()));

        reopened.clear("2|SBIN|BUY|10").unwrap();
        let reopened = JsonFileLedger::open(&path).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn entry_without_status_loads_with_empty_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(
            &path,
            r#"{"2|SBIN|BUY|10":{"order_id":"151220000000000","limit_price":"500.0","submitted_at":"2026-10-18 09:15:00"}}"#,
        )
        .unwrap();

        let ledger = JsonFileLedger::open(&path).unwrap();
        assert_eq!(ledger.lookup("2|SBIN|BUY|10").unwrap(), Some(entry()));
    }

    #[test]
    fn corrupt_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonFileLedger::open(&path), Err(LedgerError::Format(_))));
    }
}
