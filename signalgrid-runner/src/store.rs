//! Result storage.
//!
//! A store holds at most one [`BacktestResult`] per symbol. `replace` swaps
//! the whole record (result and its signals) in one step, so readers see
//! either the old record or the new one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::result::BacktestResult;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Storage capability handed to the orchestrator.
pub trait ResultStore: Send + Sync {
    /// Replace any prior record for `result.symbol`.
    fn replace(&self, result: &BacktestResult) -> Result<(), StoreError>;

    /// Current record for `symbol`, if any.
    fn load(&self, symbol: &str) -> Result<Option<BacktestResult>, StoreError>;

    /// Remove the record for `symbol`. Removing a missing record is not an error.
    fn delete(&self, symbol: &str) -> Result<(), StoreError>;
}

/// Map-backed store for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    results: Mutex<HashMap<String, BacktestResult>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for InMemoryStore {
    fn replace(&self, result: &BacktestResult) -> Result<(), StoreError> {
        let mut results = self.results.lock().map_err(|_| StoreError::Poisoned)?;
        results.insert(result.symbol.clone(), result.clone());
        Ok(())
    }

    fn load(&self, symbol: &str) -> Result<Option<BacktestResult>, StoreError> {
        let results = self.results.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(results.get(symbol).cloned())
    }

    fn delete(&self, symbol: &str) -> Result<(), StoreError> {
        let mut results = self.results.lock().map_err(|_| StoreError::Poisoned)?;
        results.remove(symbol);
        Ok(())
    }
}

/// One pretty-printed JSON file per symbol under a directory.
///
/// Writes go to a hidden temp file that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a symbol's record.
    pub fn result_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(symbol)))
    }

    fn temp_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", file_stem(symbol)))
    }
}

/// Symbol as a safe file stem: anything outside `[A-Za-z0-9._-]` becomes `_`.
fn file_stem(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl ResultStore for JsonFileStore {
    fn replace(&self, result: &BacktestResult) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(result)?;
        let temp = self.temp_path(&result.symbol);
        let target = self.result_path(&result.symbol);

        std::fs::write(&temp, json).map_err(io_error(&temp))?;
        std::fs::rename(&temp, &target).map_err(io_error(&target))?;
        Ok(())
    }

    fn load(&self, symbol: &str) -> Result<Option<BacktestResult>, StoreError> {
        let path = self.result_path(symbol);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn delete(&self, symbol: &str) -> Result<(), StoreError> {
        let path = self.result_path(symbol);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{OptimizationResult, SCHEMA_VERSION};
    use chrono::{NaiveDate, Utc};
    use signalgrid_core::domain::SignalHistory;
    use signalgrid_core::signals::Family;

    fn create_test_result(symbol: &str, hash: &str) -> BacktestResult {
        let empty = |family: Family| {
            OptimizationResult::new(family.default_params(), 0.0, SignalHistory::new())
        };
        BacktestResult {
            schema_version: SCHEMA_VERSION,
            symbol: symbol.to_string(),
            created_at: Utc::now(),
            through: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            request_hash: hash.to_string(),
            ema: empty(Family::Ema),
            bb: empty(Family::Bb),
            macd: empty(Family::Macd),
            rsi: empty(Family::Rsi),
            willr: empty(Family::Willr),
        }
    }

    #[test]
    fn in_memory_replace_load_delete() {
        let store = InMemoryStore::new();
        assert!(store.load("VOO").unwrap().is_none());

        store.replace(&create_test_result("VOO", "first")).unwrap();
        store.replace(&create_test_result("VOO", "second")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("VOO").unwrap().unwrap().request_hash, "second");

        store.delete("VOO").unwrap();
        store.delete("VOO").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn json_file_replace_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("results")).unwrap();

        let first = create_test_result("VOO", "first");
        store.replace(&first).unwrap();
        assert_eq!(store.load("VOO").unwrap(), Some(first));

        let second = create_test_result("VOO", "second");
        store.replace(&second).unwrap();
        assert_eq!(store.load("VOO").unwrap(), Some(second));

        let leftovers: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(leftovers, vec!["VOO.json".to_string()]);

        store.delete("VOO").unwrap();
        assert!(store.load("VOO").unwrap().is_none());
        store.delete("VOO").unwrap();
    }

    #[test]
    fn symbols_map_to_safe_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert_eq!(store.result_path("BRK.B"), dir.path().join("BRK.B.json"));
        assert_eq!(store.result_path("../etc"), dir.path().join(".._etc.json"));
    }

    #[test]
    fn corrupt_file_is_a_serialize_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        std::fs::write(store.result_path("BAD"), "{ not json").unwrap();
        assert!(matches!(store.load("BAD"), Err(StoreError::Serialize(_))));
    }

    #[test]
    fn hand_edited_history_that_breaks_alternation_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        store.replace(&create_test_result("VOO", "hash")).unwrap();

        let path = store.result_path("VOO");
        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["ema"]["signals"] = serde_json::json!([
            {"symbol": "VOO", "date": "2024-06-03", "price": 100.0, "action": "BUY"},
            {"symbol": "VOO", "date": "2024-06-04", "price": 101.0, "action": "BUY"},
        ]);
        std::fs::write(&path, value.to_string()).unwrap();

        match store.load("VOO") {
            Err(StoreError::Serialize(e)) => assert!(e.to_string().contains("alternation")),
            other => panic!("expected Serialize error, got {other:?}"),
        }
    }
}
