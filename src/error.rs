use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum BlogError {
    /// Network or auth failure talking to the content store. The detail is logged, not shown.
    #[error("The content store is unavailable, please try again later")]
    StoreUnavailable(String),

    #[error("Post {0} not found")]
    NotFound(String),

    #[error("Malformed post {path}: {reason}")]
    MalformedPost { path: String, reason: String },

    #[error("Post {0} was changed by someone else, reload and retry")]
    VersionConflict(String),

    #[error("A post with slug {0} already exists")]
    DuplicateSlug(String),

    #[error("Invalid slug {0}: only lowercase letters, numbers and hyphens are allowed")]
    InvalidSlug(String),
}

impl BlogError {
    /// Maps a store failure for the post `slug`.
    pub fn from_store(err: StoreError, slug: &str) -> BlogError {
        match err {
            StoreError::Unavailable(detail) => BlogError::StoreUnavailable(detail),
            StoreError::NotFound(_) => BlogError::NotFound(slug.to_string()),
            StoreError::VersionConflict(_) => BlogError::VersionConflict(slug.to_string()),
            StoreError::AlreadyExists(_) => BlogError::DuplicateSlug(slug.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_mapping() {
        let err = BlogError::from_store(StoreError::VersionConflict("content/weeks/2025/x.txt".to_string()), "x");
        assert!(matches!(err, BlogError::VersionConflict(ref s) if s == "x"));

        let err = BlogError::from_store(StoreError::AlreadyExists("p".to_string()), "x");
        assert!(matches!(err, BlogError::DuplicateSlug(_)));

        let err = BlogError::from_store(StoreError::Unavailable("401 bad credentials".to_string()), "x");
        assert_eq!(err.to_string(), "The content store is unavailable, please try again later");
    }
}
