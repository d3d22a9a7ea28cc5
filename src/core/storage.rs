// StoreLens - core/storage.rs
//
// Object store abstraction.
// Enables testing the summariser and batch logic without a real bucket or
// filesystem. The filesystem implementation lives in `platform::storage`.

use crate::util::error::StorageError;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

/// The object store operations the engine needs.
///
/// Keys are `/`-separated. Listing results are ordered and deduplicated.
pub trait ObjectStore {
    /// Distinct first-level names directly under `base`, e.g. the store ids
    /// under `processed_csvs/`. Names carry no trailing slash.
    fn list_prefixes(&self, base: &str) -> Result<Vec<String>, StorageError>;

    /// Every object key under `prefix`, at any depth.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Fetch a whole object. A missing object is `StorageError::NotFound`.
    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store a whole object, replacing any previous content.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Join a prefix and a name with exactly one `/` between them.
pub fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// `base` normalised to end in `/` (or empty for the root).
pub(crate) fn dir_prefix(base: &str) -> String {
    let trimmed = base.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// In-memory object store for tests and dry runs.
///
/// Single-threaded by construction (`RefCell`), matching the engine's
/// store-by-store execution model.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RefCell<BTreeMap<String, Vec<u8>>>,
    failing: RefCell<BTreeSet<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, key: &str, bytes: impl AsRef<[u8]>) -> Self {
        self.insert(key, bytes);
        self
    }

    pub fn insert(&self, key: &str, bytes: impl AsRef<[u8]>) {
        self.objects
            .borrow_mut()
            .insert(key.to_string(), bytes.as_ref().to_vec());
    }

    /// Make reads of `key` fail with an I/O error.
    pub fn fail_on(&self, key: &str) {
        self.failing.borrow_mut().insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list_prefixes(&self, base: &str) -> Result<Vec<String>, StorageError> {
        let base = dir_prefix(base);
        let names: BTreeSet<String> = self
            .objects
            .borrow()
            .keys()
            .filter_map(|key| key.strip_prefix(base.as_str()))
            .filter_map(|rest| rest.split_once('/').map(|(first, _)| first.to_string()))
            .filter(|name| !name.is_empty())
            .collect();
        Ok(names.into_iter().collect())
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = dir_prefix(prefix);
        Ok(self
            .objects
            .borrow()
            .keys()
            .filter(|key| key.starts_with(prefix.as_str()))
            .cloned()
            .collect())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        if self.failing.borrow().contains(key) {
            return Err(StorageError::Io {
                key: key.to_string(),
                operation: "read",
                source: std::io::Error::other("injected read failure"),
            });
        }
        self.objects
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.insert(key, bytes);
        Ok(())
    }
}
