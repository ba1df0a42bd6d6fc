use std::collections::HashMap;

use crate::content::normalizer::{normalize, NormalizeOptions};
use crate::content::raw_document::RawDocument;
use crate::error::BlogError;
use crate::post::{Post, Slug};
use crate::post_list::PostList;
use crate::store::{ContentStore, StoreError};
use crate::validation::{check_sequence, ValidationWarning};

/// Chronological neighbours of a post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjacent {
    pub previous: Option<Post>,
    pub next: Option<Post>,
}

/// Every post of the blog, in display order with a second chronological view for navigation.
#[derive(Debug, Clone, Default)]
pub struct PostCollection {
    // Newest first, ties by slug descending
    posts: Vec<Post>,
    // Indexes into `posts`, oldest first, ties by slug ascending
    navigation: Vec<usize>,
    slug_to_nav: HashMap<Slug, usize>,
}

impl PostCollection {
    pub fn new(mut posts: Vec<Post>) -> PostCollection {
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.slug.cmp(&a.slug)));

        let mut navigation: Vec<usize> = (0..posts.len()).collect();
        navigation.sort_by(|&a, &b| {
            let (a, b) = (&posts[a], &posts[b]);
            a.date.cmp(&b.date).then_with(|| a.slug.cmp(&b.slug))
        });

        let slug_to_nav = navigation.iter()
            .enumerate()
            .map(|(nav_idx, &post_idx)| (posts[post_idx].slug.clone(), nav_idx))
            .collect();

        PostCollection {
            posts,
            navigation,
            slug_to_nav,
        }
    }

    /// Newest first
    pub fn list(&self) -> &[Post] {
        &self.posts
    }

    /// Oldest first
    pub fn chronological(&self) -> Vec<&Post> {
        self.navigation.iter().map(|&idx| &self.posts[idx]).collect()
    }

    pub fn by_slug(&self, slug: &str) -> Option<&Post> {
        let nav_idx = self.slug_to_nav.get(&Slug::from(slug))?;
        Some(&self.posts[self.navigation[*nav_idx]])
    }

    /// Previous and next post in chronological order. Unknown slugs have no neighbours.
    pub fn adjacent(&self, slug: &str) -> Adjacent {
        let Some(&nav_idx) = self.slug_to_nav.get(&Slug::from(slug)) else {
            return Adjacent::default();
        };

        let previous = nav_idx.checked_sub(1)
            .map(|idx| self.posts[self.navigation[idx]].clone());
        let next = self.navigation.get(nav_idx + 1)
            .map(|&idx| self.posts[idx].clone());

        Adjacent { previous, next }
    }

    pub fn slugs(&self) -> Vec<Slug> {
        self.posts.iter().map(|p| p.slug.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Outcome of reading the whole store. Never an error: failures are reported alongside the posts.
#[derive(Debug, Default)]
pub struct Assembly {
    pub collection: PostCollection,
    pub warnings: Vec<ValidationWarning>,
    /// Documents left out because they could not be read or normalized
    pub skipped: Vec<BlogError>,
    /// Set when the store itself failed, the collection is then empty
    pub store_error: Option<BlogError>,
}

impl Assembly {
    fn failed(err: StoreError) -> Assembly {
        Assembly {
            store_error: Some(BlogError::from_store(err, "")),
            ..Default::default()
        }
    }
}

pub async fn assemble(store: &dyn ContentStore, root_dir: &str, options: &NormalizeOptions) -> Assembly {
    let post_list = PostList { store, root_dir };
    let files = match post_list.retrieve_files().await {
        Ok(files) => files,
        Err(e) => return Assembly::failed(e),
    };

    let mut posts: Vec<Post> = vec![];
    let mut paths_by_slug: HashMap<Slug, String> = HashMap::new();
    let mut warnings = vec![];
    let mut skipped = vec![];

    for entry in files {
        let stored = match store.read_file(&entry.path).await {
            Ok(stored) => stored,
            // Removed between listing and reading
            Err(StoreError::NotFound(_)) => continue,
            Err(e) => return Assembly::failed(e),
        };

        let doc = match RawDocument::from_stored(&entry.path, stored) {
            Ok(doc) => doc,
            Err(reason) => {
                skipped.push(BlogError::MalformedPost { path: entry.path, reason });
                continue;
            }
        };

        let normalized = match normalize(&doc, options) {
            Ok(normalized) => normalized,
            Err(e) => {
                skipped.push(e);
                continue;
            }
        };

        let slug = normalized.post.slug.clone();
        if paths_by_slug.contains_key(&slug) {
            warnings.push(ValidationWarning::DuplicateSlug { slug, path: entry.path });
            continue;
        }
        paths_by_slug.insert(slug, entry.path);
        warnings.extend(normalized.warnings);
        posts.push(normalized.post);
    }

    let collection = PostCollection::new(posts);
    warnings.extend(check_sequence(&collection.chronological()));

    Assembly {
        collection,
        warnings,
        skipped,
        store_error: None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::store::memory::MemoryStore;
    use crate::test_data::{sample_post, POSITIONAL_NO_SUMMARY, POSITIONAL_POST, STRUCTURED_POST};

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn options() -> NormalizeOptions {
        NormalizeOptions::new(ymd(2026, 10, 17))
    }

    fn slugs(posts: &[&Post]) -> Vec<String> {
        posts.iter().map(|p| p.slug.to_string()).collect()
    }

    fn collection() -> PostCollection {
        PostCollection::new(vec![
            sample_post("b-week", ymd(2025, 1, 6), ymd(2025, 1, 12)),
            sample_post("first", ymd(2024, 12, 30), ymd(2025, 1, 5)),
            sample_post("last", ymd(2025, 1, 13), ymd(2025, 1, 19)),
            sample_post("a-week", ymd(2025, 1, 6), ymd(2025, 1, 12)),
        ])
    }

    #[test]
    fn test_sort_orders() {
        let collection = collection();
        let display: Vec<&Post> = collection.list().iter().collect();
        assert_eq!(slugs(&display), vec!["last", "b-week", "a-week", "first"]);
        assert_eq!(slugs(&collection.chronological()), vec!["first", "a-week", "b-week", "last"]);
    }

    #[test]
    fn test_adjacent_matches_chronological_order() {
        let collection = collection();
        let sorted = collection.chronological();
        for (i, post) in sorted.iter().enumerate() {
            let adjacent = collection.adjacent(post.slug.as_str());
            let expected_previous = if i > 0 { Some(sorted[i - 1].slug.clone()) } else { None };
            let expected_next = sorted.get(i + 1).map(|p| p.slug.clone());
            assert_eq!(adjacent.previous.map(|p| p.slug), expected_previous);
            assert_eq!(adjacent.next.map(|p| p.slug), expected_next);
        }

        assert_eq!(collection.adjacent("missing"), Adjacent::default());
    }

    #[test]
    fn test_lookup() {
        let collection = collection();
        assert_eq!(collection.by_slug("a-week").unwrap().start_date, ymd(2025, 1, 6));
        assert!(collection.by_slug("nope").is_none());
        assert_eq!(collection.len(), 4);
        assert_eq!(collection.slugs()[0], Slug::from("last"));
    }

    #[tokio::test]
    async fn test_assemble_empty_store() {
        let store = MemoryStore::new();
        let assembly = assemble(&store, "content/weeks", &options()).await;
        assert!(assembly.collection.is_empty());
        assert!(assembly.store_error.is_none());
        assert_eq!(assembly.collection.adjacent("anything"), Adjacent::default());
    }

    #[tokio::test]
    async fn test_assemble_skips_malformed() {
        let store = MemoryStore::new();
        store.insert("content/weeks/2025/2025-01-06-my-title.txt", POSITIONAL_POST);
        store.insert("content/weeks/2025/2025-01-13-second-week.txt", POSITIONAL_NO_SUMMARY);
        store.insert("content/weeks/2025/2025-01-20-broken.txt", "Broken\nnot-a-date\n\n\nBody");
        store.insert("content/weeks/_template.txt", "Untitled Post\n\n\n\n");

        let assembly = assemble(&store, "content/weeks", &options()).await;
        assert!(assembly.store_error.is_none());
        assert_eq!(assembly.collection.len(), 2);
        assert_eq!(assembly.skipped.len(), 1);
        assert!(matches!(&assembly.skipped[0], BlogError::MalformedPost { path, .. } if path.ends_with("broken.txt")));
        assert_eq!(assembly.collection.list()[0].slug, Slug::from("second-week"));
    }

    #[tokio::test]
    async fn test_assemble_warnings() {
        let store = MemoryStore::new();
        store.insert("content/weeks/2024/2024-12-23-settling-in.mdx", STRUCTURED_POST);
        store.insert("content/weeks/2025/2025-01-06-my-title.txt", POSITIONAL_POST);
        store.insert("content/weeks/2025/2025-01-08-my-title.txt", "Dup\n2025-01-08\n\n\nBody");

        let assembly = assemble(&store, "content/weeks", &options()).await;
        assert_eq!(assembly.collection.len(), 2);
        assert!(assembly.warnings.contains(&ValidationWarning::DuplicateSlug {
            slug: Slug::from("my-title"),
            path: "content/weeks/2025/2025-01-08-my-title.txt".to_string(),
        }));
        assert!(assembly.warnings.contains(&ValidationWarning::Gap {
            previous: Slug::from("settling-in"),
            current: Slug::from("my-title"),
            days: 7,
        }));
    }

    #[tokio::test]
    async fn test_assemble_store_unavailable() {
        let store = MemoryStore::new();
        store.insert("content/weeks/2025/2025-01-06-my-title.txt", POSITIONAL_POST);
        store.set_unavailable(true);

        let assembly = assemble(&store, "content/weeks", &options()).await;
        assert!(assembly.collection.is_empty());
        assert!(matches!(assembly.store_error, Some(BlogError::StoreUnavailable(_))));
    }
}
