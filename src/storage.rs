//! Durable key-value storage for user preferences
//!
//! Mirrors the browser's local storage: string values under string keys.
//! The store keeps the starred-channel collection here as a JSON array.
//!
//! - `FileStorage`: a single JSON object file, rewritten on every write
//! - `MemoryStorage`: process-local, for tests and throwaway runs

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Key holding the starred-channel collection
pub const STARRED_KEY: &str = "starredChannels";

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage file {path} is not a JSON object: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// String key-value storage
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// =============================================================================
// Starred Collection Helpers
// =============================================================================

/// Load the starred collection, falling back to empty on any problem
pub fn load_starred(storage: &dyn KeyValueStorage) -> Vec<String> {
    let raw = match storage.get(STARRED_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Could not read starred channels, starting empty: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => {
            debug!("Loaded {} starred channels", ids.len());
            ids
        }
        Err(e) => {
            warn!("Stored starred channels are not a JSON string array, starting empty: {}", e);
            Vec::new()
        }
    }
}

/// Persist the starred collection as a JSON array
pub fn save_starred(storage: &dyn KeyValueStorage, ids: &[String]) -> Result<(), StorageError> {
    let raw = serde_json::to_string(ids)?;
    storage.set(STARRED_KEY, &raw)
}

// =============================================================================
// File Storage
// =============================================================================

/// JSON-object file storage
///
/// The file holds `{ "<key>": "<string value>", ... }`. Reads go to disk every
/// time so edits from other processes are picked up.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Default location (~/.local/share/tvguide/storage.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("tvguide").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, StorageError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if text.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(StorageError::Corrupt {
                path: self.path.clone(),
                reason: format!("found {}", json_kind(&other)),
            }),
            Err(e) => Err(StorageError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let text = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, text).map_err(io_err)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let map = self.read_map()?;
        Ok(map.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        // A corrupt file is replaced rather than blocking every later write
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Corrupt { reason, .. }) => {
                warn!("Overwriting corrupt storage file {}: {}", self.path.display(), reason);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map)?;
        debug!("Wrote storage key {} to {}", key, self.path.display());
        Ok(())
    }
}

// =============================================================================
// Memory Storage
// =============================================================================

/// In-memory storage
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-populated with one key
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value.into());
        storage
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
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

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_starred_missing_key_is_empty() {
        let storage = MemoryStorage::new();
        assert!(load_starred(&storage).is_empty());
    }

    #[test]
    fn test_load_starred_parses_array() {
        let storage = MemoryStorage::with_value(STARRED_KEY, r#"["2","5"]"#);
        assert_eq!(load_starred(&storage), vec!["2", "5"]);
    }

    #[test]
    fn test_load_starred_malformed_falls_back_to_empty() {
        let storage = MemoryStorage::with_value(STARRED_KEY, "not json");
        assert!(load_starred(&storage).is_empty());

        let storage = MemoryStorage::with_value(STARRED_KEY, r#"{"a":1}"#);
        assert!(load_starred(&storage).is_empty());
    }

    #[test]
    fn test_save_starred_writes_json_array() {
        let storage = MemoryStorage::new();
        save_starred(&storage, &["2".to_string(), "1".to_string()]).unwrap();
        assert_eq!(
            storage.get(STARRED_KEY).unwrap().as_deref(),
            Some(r#"["2","1"]"#)
        );
    }

    #[test]
    fn test_file_storage_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("storage.json"));
        assert_eq!(storage.get(STARRED_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_storage_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let storage = FileStorage::new(&path);

        storage.set(STARRED_KEY, r#"["1"]"#).unwrap();
        storage.set("theme", "dark").unwrap();

        assert!(path.exists());
        assert_eq!(storage.get(STARRED_KEY).unwrap().as_deref(), Some(r#"["1"]"#));
        assert_eq!(storage.get("theme").unwrap().as_deref(), Some("dark"));

        // A fresh handle sees the same data
        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_storage_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let storage = FileStorage::new(&path);

        assert!(matches!(
            storage.get(STARRED_KEY),
            Err(StorageError::Corrupt { .. })
        ));
        assert!(load_starred(&storage).is_empty());

        // Writing replaces the corrupt content
        storage.set(STARRED_KEY, "[]").unwrap();
        assert_eq!(storage.get(STARRED_KEY).unwrap().as_deref(), Some("[]"));
    }
}
