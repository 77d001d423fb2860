//! Persistent preference storage
//!
//! Page size and hidden-column sets survive between sessions through a
//! `PreferenceStore`. Read and write failures are logged and treated as
//! "nothing stored"; they never abort rendering.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key of the page-size preference, shared by every paginated table
pub const PER_PAGE_KEY: &str = "table-views:per-page";

/// Prefix of the per-table hidden-column keys
pub const HIDDEN_COLUMNS_PREFIX: &str = "table-views:hidden-columns:";

pub fn hidden_columns_key(table_key: &str) -> String {
    format!("{}{}", HIDDEN_COLUMNS_PREFIX, table_key)
}

/// String key/value store with explicit load/save semantics
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object on disk, re-read on every access
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under the user's data directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::utils::app_paths::AppPaths::preferences_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_content(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(Some(content).filter(|c| !c.trim().is_empty()))
    }

    fn load_all(&self) -> Result<BTreeMap<String, String>> {
        match self.read_content()? {
            Some(content) => serde_json::from_str(&content)
                .with_context(|| format!("Corrupt preferences file {}", self.path.display())),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Entries to update, plus whether the file must be rewritten regardless.
    /// A corrupt file is replaced rather than blocking every later write.
    fn load_for_update(&self) -> Result<(BTreeMap<String, String>, bool)> {
        let Some(content) = self.read_content()? else {
            return Ok((BTreeMap::new(), false));
        };
        match serde_json::from_str(&content) {
            Ok(entries) => Ok((entries, false)),
            Err(e) => {
                warn!(
                    target: "preferences",
                    "Replacing corrupt preferences file {}: {}",
                    self.path.display(),
                    e
                );
                Ok((BTreeMap::new(), true))
            }
        }
    }

    fn save_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let (mut entries, _) = self.load_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.save_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let (mut entries, corrupt) = self.load_for_update()?;
        if entries.remove(key).is_some() || corrupt {
            self.save_all(&entries)?;
        }
        Ok(())
    }
}

/// Read and decode a JSON value; any failure counts as "no stored preference"
pub fn load_json<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(target: "preferences", "Failed to read preference '{}': {:#}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => {
            debug!(target: "preferences", "Loaded preference '{}'", key);
            Some(value)
        }
        Err(e) => {
            warn!(target: "preferences", "Ignoring corrupt preference '{}': {}", key, e);
            None
        }
    }
}

/// Encode and write a JSON value, logging failures
pub fn save_json<T: Serialize>(store: &dyn PreferenceStore, key: &str, value: &T) -> bool {
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(target: "preferences", "Failed to encode preference '{}': {}", key, e);
            return false;
        }
    };
    match store.set(key, &encoded) {
        Ok(()) => true,
        Err(e) => {
            warn!(target: "preferences", "Failed to save preference '{}': {:#}", key, e);
            false
        }
    }
}

pub fn remove_key(store: &dyn PreferenceStore, key: &str) -> bool {
    match store.remove(key) {
        Ok(()) => true,
        Err(e) => {
            warn!(target: "preferences", "Failed to remove preference '{}': {:#}", key, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use tempfile::TempDir;

    struct FailingStore;

    impl PreferenceStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            bail!("storage unavailable")
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            bail!("quota exceeded")
        }
        fn remove(&self, _key: &str) -> Result<()> {
            bail!("storage unavailable")
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(save_json(&store, PER_PAGE_KEY, &50usize));
        assert_eq!(load_json::<usize>(&store, PER_PAGE_KEY), Some(50));
        assert!(remove_key(&store, PER_PAGE_KEY));
        assert_eq!(load_json::<usize>(&store, PER_PAGE_KEY), None);
    }

    #[test]
    fn test_corrupt_value_is_ignored() {
        let store = MemoryStore::new();
        store.set(PER_PAGE_KEY, "not json").unwrap();
        assert_eq!(load_json::<usize>(&store, PER_PAGE_KEY), None);
    }

    #[test]
    fn test_failures_are_swallowed() {
        let store = FailingStore;
        assert_eq!(load_json::<usize>(&store, PER_PAGE_KEY), None);
        assert!(!save_json(&store, PER_PAGE_KEY, &10usize));
        assert!(!remove_key(&store, PER_PAGE_KEY));
    }

    #[test]
    fn test_json_file_store_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("prefs.json");

        let store = JsonFileStore::new(&path);
        store.set("a", "1").unwrap();
        store.set("b", "[1,3]").unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("b").unwrap(), Some("[1,3]".to_string()));
        reopened.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_json_file_store_reports_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        fs::write(&path, "{ broken").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.get("a").is_err());
        assert_eq!(load_json::<usize>(&store, "a"), None);
    }

    #[test]
    fn test_json_file_store_replaces_corrupt_file_on_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        fs::write(&path, "{ broken").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(save_json(&store, PER_PAGE_KEY, &5usize));
        assert_eq!(load_json::<usize>(&store, PER_PAGE_KEY), Some(5));
        assert!(!fs::read_to_string(&path).unwrap().contains("broken"));

        fs::write(&path, "{ broken").unwrap();
        assert!(remove_key(&store, PER_PAGE_KEY));
        assert_eq!(store.get(PER_PAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_hidden_columns_key_is_namespaced() {
        assert_eq!(
            hidden_columns_key("orders"),
            "table-views:hidden-columns:orders"
        );
    }
}
