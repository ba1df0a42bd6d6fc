use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

pub mod github;
pub mod local;
pub mod memory;

/// Opaque revision token of a stored file. Conditional writes and deletes compare against it.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct Version(pub String);

impl Version {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub version: Option<Version>,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    pub version: Version,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Content store unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Version mismatch for {0}")]
    VersionConflict(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// File store addressed by `/`-separated paths.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list(&self, dir: &str) -> StoreResult<Vec<StoreEntry>>;

    async fn read_file(&self, path: &str) -> StoreResult<StoredFile>;

    /// Without `expected` the file must not exist yet. With it, the stored version must match.
    async fn write_file(&self, path: &str, bytes: &[u8], expected: Option<&Version>, message: &str) -> StoreResult<Version>;

    async fn delete_file(&self, path: &str, expected: &Version, message: &str) -> StoreResult<()>;
}

pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Last component of a store path
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(join_path("content/weeks", "2025"), "content/weeks/2025");
        assert_eq!(join_path("content/weeks/", "a.txt"), "content/weeks/a.txt");
        assert_eq!(join_path("", "a.txt"), "a.txt");
        assert_eq!(base_name("content/weeks/2025/a.txt"), "a.txt");
        assert_eq!(base_name("a.txt"), "a.txt");
    }
}
