// StoreLens - platform/storage.rs
//
// Filesystem-backed object store. Keys map to paths under a root directory,
// so a synced copy of the bucket (or a local test tree) can be processed
// exactly like the remote one.

use crate::core::storage::{dir_prefix, ObjectStore};
use crate::util::constants::{MAX_READ_RETRIES, READ_RETRY_DELAYS_MS};
use crate::util::error::StorageError;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Convert a path under the root back into a `/`-separated key.
    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl ObjectStore for LocalObjectStore {
    fn list_prefixes(&self, base: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.path_for(base);
        if !dir.is_dir() {
            tracing::debug!(path = %dir.display(), "Prefix directory does not exist");
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| StorageError::Traversal {
                prefix: base.to_string(),
                source: e,
            })?;
            if entry.file_type().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.path_for(prefix);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&dir).follow_links(false) {
            let entry = entry.map_err(|e| StorageError::Traversal {
                prefix: prefix.to_string(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(key) = self.key_for(entry.path()) {
                keys.push(key);
            }
        }
        keys.sort();

        let wanted = dir_prefix(prefix);
        keys.retain(|k| k.starts_with(wanted.as_str()));
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key);
        read_with_retry(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                StorageError::Io {
                    key: key.to_string(),
                    operation: "read",
                    source: e,
                }
            }
        })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let io_err = |operation, source| StorageError::Io {
            key: key.to_string(),
            operation,
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err("create directory", e))?;
        }
        std::fs::write(&path, bytes).map_err(|e| io_err("write", e))?;
        tracing::debug!(key, bytes = bytes.len(), "Object written");
        Ok(())
    }
}

/// Read a whole file, retrying transient I/O errors.
fn read_with_retry(path: &Path) -> io::Result<Vec<u8>> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_READ_RETRIES {
        match std::fs::read(path) {
            Ok(bytes) => return Ok(bytes),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(
                    READ_RETRY_DELAYS_MS[attempt as usize],
                ));
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown read error")))
}

fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, LocalObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        for (key, content) in files {
            store.put(key, content.as_bytes()).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_list_prefixes_only_directories_sorted() {
        let (_dir, store) = store_with(&[
            ("processed_csvs/0200/str.csv", "x"),
            ("processed_csvs/0100/str.csv", "x"),
            ("processed_csvs/0100/sub/deep.csv", "x"),
            ("processed_csvs/notes.txt", "x"),
        ]);
        let prefixes = store.list_prefixes("processed_csvs/").unwrap();
        assert_eq!(prefixes, vec!["0100", "0200"]);
    }

    #[test]
    fn test_list_prefixes_missing_base_is_empty() {
        let (_dir, store) = store_with(&[]);
        assert!(store.list_prefixes("processed_csvs/").unwrap().is_empty());
    }

    #[test]
    fn test_list_keys_recursive_with_slashes() {
        let (_dir, store) = store_with(&[
            ("store_reports/a_summary.csv", "x"),
            ("store_reports/nested/b_summary.csv", "x"),
            ("elsewhere/c.csv", "x"),
        ]);
        let keys = store.list_keys("store_reports/").unwrap();
        assert_eq!(
            keys,
            vec![
                "store_reports/a_summary.csv",
                "store_reports/nested/b_summary.csv"
            ]
        );
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_dir, store) = store_with(&[]);
        assert!(store.get("processed_csvs/1/str.csv").unwrap_err().is_not_found());
    }

    #[test]
    fn test_put_creates_parents_and_get_reads_back() {
        let (dir, store) = store_with(&[("a/b/c.csv", "hello")]);
        assert!(dir.path().join("a").join("b").join("c.csv").is_file());
        assert_eq!(store.get("a/b/c.csv").unwrap(), b"hello");
    }
}
