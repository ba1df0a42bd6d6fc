use crate::content::parsing_utils::parse_front_matter;
use crate::content::raw_document::{DocumentFormat, RawDocument};
use crate::content::slug::slug_from_file_name;
use crate::post::Slug;
use crate::store::{ContentStore, EntryKind, StoreEntry, StoreError, StoreResult};

/// Walks the content root of a store: `{root}/{yyyy}/*` plus legacy files directly under `{root}`.
pub struct PostList<'a> {
    pub store: &'a dyn ContentStore,
    pub root_dir: &'a str,
}

/// A post file and the slug it answers to.
#[derive(Debug, Clone)]
pub struct PostLocation {
    pub slug: Slug,
    pub entry: StoreEntry,
}

impl PostList<'_> {
    /// Post files in listing order. A missing root is an empty blog, not an error.
    pub async fn retrieve_files(&self) -> StoreResult<Vec<StoreEntry>> {
        let root_entries = match self.store.list(self.root_dir).await {
            Ok(entries) => entries,
            Err(StoreError::NotFound(_)) => return Ok(vec![]),
            Err(e) => return Err(e),
        };

        let mut files = vec![];
        for entry in root_entries {
            if is_reserved(&entry.name) {
                continue;
            }
            match entry.kind {
                EntryKind::Dir if is_year_dir(&entry.name) => {
                    let year_entries = match self.store.list(&entry.path).await {
                        Ok(entries) => entries,
                        Err(StoreError::NotFound(_)) => continue,
                        Err(e) => return Err(e),
                    };
                    files.extend(year_entries.into_iter().filter(is_post_file));
                }
                EntryKind::File if is_post_file(&entry) => files.push(entry),
                _ => {}
            }
        }
        Ok(files)
    }

    /// Fresh listing of every post file with its slug. Structured files are read for an explicit slug.
    pub async fn retrieve_locations(&self) -> StoreResult<Vec<PostLocation>> {
        let mut locations = vec![];
        for entry in self.retrieve_files().await? {
            let slug = match RawDocument::guess_format(&entry.path) {
                Some(DocumentFormat::Structured) => self.structured_slug(&entry).await?,
                _ => slug_from_file_name(&entry.name),
            };
            locations.push(PostLocation { slug, entry });
        }
        Ok(locations)
    }

    /// Store path currently holding `slug`, found by listing again.
    pub async fn resolve(&self, slug: &str) -> StoreResult<Option<PostLocation>> {
        let locations = self.retrieve_locations().await?;
        Ok(locations.into_iter().find(|l| l.slug.as_str() == slug))
    }

    async fn structured_slug(&self, entry: &StoreEntry) -> StoreResult<Slug> {
        let file_slug = slug_from_file_name(&entry.name);
        let stored = match self.store.read_file(&entry.path).await {
            Ok(stored) => stored,
            Err(StoreError::NotFound(_)) => return Ok(file_slug),
            Err(e) => return Err(e),
        };

        let text = String::from_utf8_lossy(&stored.bytes);
        let slug = parse_front_matter(&text).ok()
            .and_then(|(meta, _)| meta.slug)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(Slug)
            .unwrap_or(file_slug);
        Ok(slug)
    }
}

/// Names starting with `_` are templates and never posts
pub fn is_reserved(name: &str) -> bool {
    name.starts_with('_')
}

fn is_year_dir(name: &str) -> bool {
    name.len() == 4 && name.chars().all(|c| c.is_ascii_digit())
}

fn is_post_file(entry: &StoreEntry) -> bool {
    entry.kind == EntryKind::File
        && !is_reserved(&entry.name)
        && RawDocument::guess_format(&entry.name).is_some()
}

#[cfg(test)]
mod tests {
    use crate::store::memory::MemoryStore;
    use crate::test_data::{POSITIONAL_POST, STRUCTURED_POST};

    use super::*;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("content/weeks/_template.txt", "Untitled Post");
        store.insert("content/weeks/2025/2025-01-06-my-title.txt", POSITIONAL_POST);
        store.insert("content/weeks/2025/_draft.txt", POSITIONAL_POST);
        store.insert("content/weeks/2025/cover.png", "png");
        store.insert("content/weeks/2024/old.mdx", STRUCTURED_POST);
        store.insert("content/weeks/drafts/2025-02-03-hidden.txt", POSITIONAL_POST);
        store.insert("content/weeks/legacy-week.txt", POSITIONAL_POST);
        store
    }

    #[tokio::test]
    async fn test_retrieve_files() {
        let store = store();
        let post_list = PostList { store: &store, root_dir: "content/weeks" };
        let files = post_list.retrieve_files().await.unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec![
            "content/weeks/legacy-week.txt",
            "content/weeks/2024/old.mdx",
            "content/weeks/2025/2025-01-06-my-title.txt",
        ]);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let store = MemoryStore::new();
        let post_list = PostList { store: &store, root_dir: "content/weeks" };
        assert!(post_list.retrieve_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve() {
        let store = store();
        let post_list = PostList { store: &store, root_dir: "content/weeks" };

        let location = post_list.resolve("my-title").await.unwrap().unwrap();
        assert_eq!(location.entry.path, "content/weeks/2025/2025-01-06-my-title.txt");

        // Slug comes from front matter, not from `old.mdx`
        let location = post_list.resolve("settling-in").await.unwrap().unwrap();
        assert_eq!(location.entry.path, "content/weeks/2024/old.mdx");
        assert!(post_list.resolve("old").await.unwrap().is_none());

        assert!(post_list.resolve("hidden").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = store();
        store.set_unavailable(true);
        let post_list = PostList { store: &store, root_dir: "content/weeks" };
        assert!(matches!(post_list.retrieve_files().await, Err(StoreError::Unavailable(_))));
    }
}
