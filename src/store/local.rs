use std::io;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::Mutex;

use crate::store::{join_path, ContentStore, EntryKind, StoreEntry, StoreError, StoreResult, StoredFile, Version};

/// Store backed by a directory on the local filesystem.
/// The version of a file is the SHA-256 of its bytes, so edits made outside the blog move it too.
pub struct LocalStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(base_dir: &Path) -> Self {
        LocalStore {
            base_dir: base_dir.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn full_path(&self, path: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(path);
        let is_safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !is_safe {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(self.base_dir.join(relative))
    }

    async fn current_version(&self, full_path: &Path) -> StoreResult<Option<Version>> {
        match fs::read(full_path).await {
            Ok(bytes) => Ok(Some(version_of(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e, full_path)),
        }
    }
}

pub fn version_of(bytes: &[u8]) -> Version {
    let digest = Sha256::digest(bytes);
    Version(hex::encode(digest))
}

fn io_error(e: io::Error, path: &Path) -> StoreError {
    let path = path.to_string_lossy().to_string();
    match e.kind() {
        ErrorKind::NotFound => StoreError::NotFound(path),
        _ => StoreError::Unavailable(format!("{} - file={}", e, path)),
    }
}

fn to_naive(time: io::Result<SystemTime>) -> Option<NaiveDateTime> {
    time.ok().map(|t| DateTime::<Utc>::from(t).naive_utc())
}

#[async_trait]
impl ContentStore for LocalStore {
    async fn list(&self, dir: &str) -> StoreResult<Vec<StoreEntry>> {
        let full_dir = self.full_path(dir)?;
        let mut read_dir = fs::read_dir(&full_dir).await.map_err(|e| io_error(e, &full_dir))?;

        let mut entries = vec![];
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| io_error(e, &full_dir))? {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            let Some(name) = entry.file_name().to_str().map(|s| s.to_string()) else {
                continue;
            };

            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };

            entries.push(StoreEntry {
                path: join_path(dir, &name),
                name,
                kind,
                version: None,
            });
        }

        // read_dir order is platform dependent
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> StoreResult<StoredFile> {
        let full_path = self.full_path(path)?;
        let bytes = fs::read(&full_path).await.map_err(|e| io_error(e, &full_path))?;
        let (created, modified) = match fs::metadata(&full_path).await {
            Ok(meta) => {
                let modified = to_naive(meta.modified());
                let created = to_naive(meta.created()).or(modified);
                (created, modified)
            }
            Err(_) => (None, None),
        };

        Ok(StoredFile {
            version: version_of(&bytes),
            bytes,
            created,
            modified,
        })
    }

    async fn write_file(&self, path: &str, bytes: &[u8], expected: Option<&Version>, _message: &str) -> StoreResult<Version> {
        let full_path = self.full_path(path)?;
        let _guard = self.write_lock.lock().await;

        match (self.current_version(&full_path).await?, expected) {
            (Some(_), None) => return Err(StoreError::AlreadyExists(path.to_string())),
            (None, Some(_)) => return Err(StoreError::NotFound(path.to_string())),
            (Some(current), Some(expected)) if &current != expected => {
                return Err(StoreError::VersionConflict(path.to_string()));
            }
            _ => {}
        }

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_error(e, parent))?;
        }
        fs::write(&full_path, bytes).await.map_err(|e| io_error(e, &full_path))?;
        Ok(version_of(bytes))
    }

    async fn delete_file(&self, path: &str, expected: &Version, _message: &str) -> StoreResult<()> {
        let full_path = self.full_path(path)?;
        let _guard = self.write_lock.lock().await;

        match self.current_version(&full_path).await? {
            None => return Err(StoreError::NotFound(path.to_string())),
            Some(current) if &current != expected => return Err(StoreError::VersionConflict(path.to_string())),
            Some(_) => {}
        }

        fs::remove_file(&full_path).await.map_err(|e| io_error(e, &full_path))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_write_list_read() {
        let (_dir, store) = store();
        let version = store.write_file("content/weeks/2025/2025-01-06-a.txt", b"Title\n2025-01-06", None, "create").await.unwrap();
        store.write_file("content/weeks/root.txt", b"x", None, "create").await.unwrap();

        let entries = store.list("content/weeks").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(names, vec![("2025", EntryKind::Dir), ("root.txt", EntryKind::File)]);
        assert_eq!(entries[0].path, "content/weeks/2025");

        let file = store.read_file("content/weeks/2025/2025-01-06-a.txt").await.unwrap();
        assert_eq!(file.bytes, b"Title\n2025-01-06");
        assert_eq!(file.version, version);
        assert!(file.modified.is_some());
    }

    #[tokio::test]
    async fn test_missing_dir() {
        let (_dir, store) = store();
        assert!(matches!(store.list("content/weeks").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_conflicts() {
        let (_dir, store) = store();
        let v1 = store.write_file("a.txt", b"one", None, "create").await.unwrap();
        assert!(matches!(store.write_file("a.txt", b"one", None, "create").await, Err(StoreError::AlreadyExists(_))));

        let v2 = store.write_file("a.txt", b"two", Some(&v1), "update").await.unwrap();
        assert!(matches!(store.write_file("a.txt", b"three", Some(&v1), "update").await, Err(StoreError::VersionConflict(_))));
        assert!(matches!(store.delete_file("a.txt", &v1, "delete").await, Err(StoreError::VersionConflict(_))));

        store.delete_file("a.txt", &v2, "delete").await.unwrap();
        assert!(matches!(store.read_file("a.txt").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rejects_parent_paths() {
        let (_dir, store) = store();
        assert!(store.read_file("../etc/passwd").await.is_err());
        assert!(store.write_file("/tmp/x.txt", b"x", None, "create").await.is_err());
    }

    #[test]
    fn test_version_of() {
        assert_eq!(version_of(b"").0, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_ne!(version_of(b"a"), version_of(b"b"));
    }
}
