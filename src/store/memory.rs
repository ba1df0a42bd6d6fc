use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::store::{join_path, ContentStore, EntryKind, StoreEntry, StoreError, StoreResult, StoredFile, Version};

struct MemoryFile {
    bytes: Vec<u8>,
    revision: u64,
}

struct Files {
    files: BTreeMap<String, MemoryFile>,
    next_revision: u64,
}

/// Process-local store. Versions are increasing revision numbers.
pub struct MemoryStore {
    files: Mutex<Files>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            files: Mutex::new(Files { files: BTreeMap::new(), next_revision: 1 }),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Seeds a file regardless of its current state and returns its new version.
    pub fn insert(&self, path: &str, content: &str) -> Version {
        let mut files = self.lock();
        let revision = files.next_revision;
        files.next_revision += 1;
        files.files.insert(path.to_string(), MemoryFile { bytes: content.as_bytes().to_vec(), revision });
        Version(revision.to_string())
    }

    /// Makes every following call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().files.contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Files> {
        // A poisoned map is still consistent, every mutation is a single insert or remove
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list(&self, dir: &str) -> StoreResult<Vec<StoreEntry>> {
        self.check_available()?;
        let dir = dir.trim_end_matches('/');
        let prefix = format!("{}/", dir);
        let files = self.lock();

        let mut entries = vec![];
        let mut sub_dirs = BTreeSet::new();
        for (path, file) in files.files.iter() {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((sub_dir, _)) => {
                    sub_dirs.insert(sub_dir.to_string());
                }
                None => entries.push(StoreEntry {
                    name: rest.to_string(),
                    path: path.clone(),
                    kind: EntryKind::File,
                    version: Some(Version(file.revision.to_string())),
                }),
            }
        }

        if entries.is_empty() && sub_dirs.is_empty() {
            return Err(StoreError::NotFound(dir.to_string()));
        }

        for sub_dir in sub_dirs {
            entries.push(StoreEntry {
                path: join_path(dir, &sub_dir),
                name: sub_dir,
                kind: EntryKind::Dir,
                version: None,
            });
        }
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> StoreResult<StoredFile> {
        self.check_available()?;
        let files = self.lock();
        match files.files.get(path) {
            Some(file) => Ok(StoredFile {
                bytes: file.bytes.clone(),
                version: Version(file.revision.to_string()),
                created: None,
                modified: None,
            }),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    async fn write_file(&self, path: &str, bytes: &[u8], expected: Option<&Version>, _message: &str) -> StoreResult<Version> {
        self.check_available()?;
        let mut files = self.lock();
        let current = files.files.get(path).map(|f| Version(f.revision.to_string()));
        match (current, expected) {
            (Some(_), None) => return Err(StoreError::AlreadyExists(path.to_string())),
            (None, Some(_)) => return Err(StoreError::NotFound(path.to_string())),
            (Some(current), Some(expected)) if &current != expected => {
                return Err(StoreError::VersionConflict(path.to_string()));
            }
            _ => {}
        }

        let revision = files.next_revision;
        files.next_revision += 1;
        files.files.insert(path.to_string(), MemoryFile { bytes: bytes.to_vec(), revision });
        Ok(Version(revision.to_string()))
    }

    async fn delete_file(&self, path: &str, expected: &Version, _message: &str) -> StoreResult<()> {
        self.check_available()?;
        let mut files = self.lock();
        let current = match files.files.get(path) {
            Some(file) => Version(file.revision.to_string()),
            None => return Err(StoreError::NotFound(path.to_string())),
        };
        if &current != expected {
            return Err(StoreError::VersionConflict(path.to_string()));
        }
        files.files.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_files_and_dirs() {
        let store = MemoryStore::new();
        store.insert("content/weeks/2025/2025-01-06-a.txt", "a");
        store.insert("content/weeks/2025/2025-01-13-b.txt", "b");
        store.insert("content/weeks/legacy.mdx", "c");

        let entries = store.list("content/weeks").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[0].name, "legacy.mdx");
        assert_eq!(entries[1].kind, EntryKind::Dir);
        assert_eq!(entries[1].path, "content/weeks/2025");

        let entries = store.list("content/weeks/2025").await.unwrap();
        assert_eq!(entries.len(), 2);

        assert!(matches!(store.list("content/other").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_conditional_write() {
        let store = MemoryStore::new();
        let v1 = store.write_file("a.txt", b"one", None, "create").await.unwrap();
        assert!(matches!(store.write_file("a.txt", b"two", None, "create").await, Err(StoreError::AlreadyExists(_))));

        let v2 = store.write_file("a.txt", b"two", Some(&v1), "update").await.unwrap();
        assert_ne!(v1, v2);
        assert!(matches!(store.write_file("a.txt", b"three", Some(&v1), "update").await, Err(StoreError::VersionConflict(_))));

        let file = store.read_file("a.txt").await.unwrap();
        assert_eq!(file.bytes, b"two");
        assert_eq!(file.version, v2);
    }

    #[tokio::test]
    async fn test_conditional_delete() {
        let store = MemoryStore::new();
        let v1 = store.insert("a.txt", "one");
        let v2 = store.insert("a.txt", "two");
        assert!(matches!(store.delete_file("a.txt", &v1, "delete").await, Err(StoreError::VersionConflict(_))));
        store.delete_file("a.txt", &v2, "delete").await.unwrap();
        assert!(!store.contains("a.txt"));
        assert!(matches!(store.delete_file("a.txt", &v2, "delete").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryStore::new();
        store.insert("a/b.txt", "x");
        store.set_unavailable(true);
        assert!(matches!(store.list("a").await, Err(StoreError::Unavailable(_))));
        store.set_unavailable(false);
        assert!(store.list("a").await.is_ok());
    }
}
