//! Key-value storage for tabboard state
//!
//! The dashboard persists each collection (todos, and anything else the
//! front end keeps) as one JSON value under a string key, overwriting the
//! whole value on every save. [`KeyValueStore`] is that contract;
//! [`FileStore`] keeps all keys in a single JSON document on disk and
//! [`MemoryStore`] keeps them in process.
//!
//! # File layout
//!
//! ```text
//! <data dir>/
//!   storage.json        # {"todos": [...], ...}
//!   storage.json.lock   # advisory lock held during reads and writes
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// Default file name of the on-disk store
pub const STORE_FILE: &str = "storage.json";

/// Whole-value key-value storage
pub trait KeyValueStore {
    /// Value stored under `key`, or `None` if nothing was ever saved there
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrite the value under `key`
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Drop `key`; absent keys are ignored
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Load and deserialize the value under `key`
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Serialize `data` and store it under `key`
pub fn save_json<T, S>(store: &S, key: &str, data: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let value = serde_json::to_value(data)?;
    store.set(key, value)
}

// =========================================================================
// On-disk store
// =========================================================================

/// All keys in one pretty-printed JSON object on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Store rooted in a data directory, using [`STORE_FILE`]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        match lock::read_locked(&self.path, self.lock_timeout_ms)? {
            Some(bytes) => self.parse_document(&bytes),
            None => Ok(Map::new()),
        }
    }

    fn parse_document(&self, bytes: &[u8]) -> Result<Map<String, Value>> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Storage(format!(
                "{}: expected a JSON object at top level, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    /// Read-modify-write of the whole document under one lock
    fn update_document<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let _lock = lock::FileLock::acquire(lock::lock_path_for(&self.path), self.lock_timeout_ms)?;

        let mut document = match std::fs::read(&self.path) {
            Ok(bytes) => self.parse_document(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(Error::Io(err)),
        };

        mutate(&mut document);

        let json = serde_json::to_string_pretty(&Value::Object(document))?;
        lock::write_atomic(&self.path, json.as_bytes())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut document = self.read_document()?;
        let value = document.remove(key);
        tracing::debug!(key, path = %self.path.display(), found = value.is_some(), "store read");
        Ok(value)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.update_document(|document| {
            document.insert(key.to_string(), value);
        })?;
        tracing::debug!(key, path = %self.path.display(), "store write");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update_document(|document| {
            document.remove(key);
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =========================================================================
// In-process store
// =========================================================================

/// In-memory store; can be switched into a failing mode to exercise
/// error paths in callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, Value>>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::Storage(format!("write to '{key}' rejected")));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.check_writable(key)?;
        self.entries.borrow_mut().insert(key.to_string(), value);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.entries.borrow_mut().remove(key);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn file_store_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(temp_dir.path());

        assert_eq!(store.path(), temp_dir.path().join(STORE_FILE).as_path());
        assert!(store.get("todos").unwrap().is_none());
    }

    #[test]
    fn file_store_keys_are_independent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(temp_dir.path());

        store.set("todos", json!([{"id": "a"}])).unwrap();
        store.set("notes", json!("# hello")).unwrap();

        assert_eq!(store.get("todos").unwrap(), Some(json!([{"id": "a"}])));
        assert_eq!(store.get("notes").unwrap(), Some(json!("# hello")));

        store.set("todos", json!([])).unwrap();
        assert_eq!(store.get("todos").unwrap(), Some(json!([])));
        assert_eq!(store.get("notes").unwrap(), Some(json!("# hello")));

        store.remove("notes").unwrap();
        assert!(store.get("notes").unwrap().is_none());
    }

    #[test]
    fn file_store_is_shared_between_handles() {
        let temp_dir = TempDir::new().unwrap();
        let first = FileStore::in_dir(temp_dir.path());
        let second = FileStore::in_dir(temp_dir.path()).with_lock_timeout(500);

        first.set("todos", json!([1, 2, 3])).unwrap();
        assert_eq!(second.get("todos").unwrap(), Some(json!([1, 2, 3])));
    }

    #[test]
    fn concurrent_sets_keep_every_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE);

        let handles: Vec<_> = (0..4)
            .map(|idx| {
                let store = FileStore::new(path.clone());
                std::thread::spawn(move || {
                    store.set(&format!("panel-{idx}"), json!(idx)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = FileStore::new(path);
        for idx in 0..4 {
            assert_eq!(store.get(&format!("panel-{idx}")).unwrap(), Some(json!(idx)));
        }
    }

    #[test]
    fn file_store_rejects_non_object_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(temp_dir.path());
        std::fs::write(store.path(), "[1,2]").unwrap();

        let err = store.get("todos").unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn typed_helpers_round_trip_through_store() {
        let store = MemoryStore::new();
        assert!(load_json::<Vec<u32>, _>(&store, "numbers").unwrap().is_none());

        save_json(&store, "numbers", &vec![4u32, 5]).unwrap();
        let loaded: Option<Vec<u32>> = load_json(&store, "numbers").unwrap();
        assert_eq!(loaded, Some(vec![4, 5]));
    }

    #[test]
    fn memory_store_failing_writes_keep_previous_value() {
        let store = MemoryStore::new();
        store.set("todos", json!([])).unwrap();
        store.fail_writes(true);

        assert!(matches!(store.set("todos", json!([1])), Err(Error::Storage(_))));
        assert_eq!(store.get("todos").unwrap(), Some(json!([])));
        assert_eq!(store.write_count(), 1);

        store.fail_writes(false);
        store.set("todos", json!([1])).unwrap();
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.keys(), vec!["todos".to_string()]);
    }
}
