use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::{Duration, Local, NaiveDate};
use spdlog::{error, info, warn};

use crate::config::{Config, StoreKind};
use crate::content::normalizer::NormalizeOptions;
use crate::content_cache::{ContentCache, Expire};
use crate::error::BlogError;
use crate::gateway::{fill_template, PostGateway, PostSource};
use crate::post::{Post, Slug};
use crate::post_cache::{assemble, Adjacent, Assembly};
use crate::store::github::{GitHubRepo, GitHubStore, DEFAULT_API_BASE};
use crate::store::local::LocalStore;
use crate::store::{ContentStore, Version};
use crate::text_utils::{DEFAULT_SUMMARY_LENGTH, DEFAULT_WORDS_PER_MINUTE};

const ASSEMBLY_KEY: &str = "assembly";

/// Edits made outside this process show up after this long
const CACHE_TTL_MINUTES: i64 = 5;

/// Read and write surface of the blog over one content store.
pub struct Blog {
    store: Arc<dyn ContentStore>,
    root_dir: String,
    words_per_minute: u32,
    summary_length: usize,
    cache: ContentCache<Assembly>,
    /// Bumped by every successful write
    generation: AtomicU64,
}

impl Blog {
    pub fn new(store: Arc<dyn ContentStore>, root_dir: &str) -> Blog {
        Blog {
            store,
            root_dir: root_dir.trim_end_matches('/').to_string(),
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            summary_length: DEFAULT_SUMMARY_LENGTH,
            cache: ContentCache::non_caching(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_cache(mut self, enabled: bool) -> Blog {
        self.cache = if enabled { ContentCache::new() } else { ContentCache::non_caching() };
        self
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Blog> {
        let store: Arc<dyn ContentStore> = match config.store_kind() {
            StoreKind::Local => {
                info!("Using local content store in {}", config.content.local_dir.display());
                Arc::new(LocalStore::new(&config.content.local_dir))
            }
            StoreKind::GitHub => {
                let github = config.github.as_ref()
                    .ok_or_else(|| anyhow!("GitHub store selected but [github] is missing from the configuration"))?;
                let token = env::var(github.token_env()).ok().filter(|t| !t.is_empty());
                if token.is_none() {
                    warn!("{} is not set, GitHub requests are anonymous", github.token_env());
                }
                let api_base = github.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
                let repo = GitHubRepo::parse(api_base, &github.repo, github.branch.clone(), token)
                    .map_err(|e| anyhow!(e))?;
                info!("Using GitHub content store {}", github.repo);
                Arc::new(GitHubStore::new(repo).context("Could not create the GitHub client")?)
            }
        };

        let mut blog = Blog::new(store, &config.content.root).with_cache(config.defaults.cache_enabled);
        if let Some(wpm) = config.defaults.words_per_minute {
            blog.words_per_minute = wpm;
        }
        if let Some(length) = config.defaults.summary_length {
            blog.summary_length = length;
        }
        Ok(blog)
    }

    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    fn gateway(&self) -> PostGateway<'_> {
        PostGateway { store: self.store.as_ref(), root_dir: &self.root_dir }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Reads every post from the store, bypassing the cache. Nothing is logged.
    pub async fn read_all(&self) -> Assembly {
        let options = NormalizeOptions {
            today: Self::today(),
            words_per_minute: self.words_per_minute,
            summary_length: self.summary_length,
        };
        assemble(self.store.as_ref(), &self.root_dir, &options).await
    }

    /// Whole collection with its warnings. Failed reads are reported, logged and never cached.
    pub async fn assemble(&self) -> Arc<Assembly> {
        if let Some(assembly) = self.cache.get(ASSEMBLY_KEY) {
            return assembly;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let assembly = self.read_all().await;
        for warning in &assembly.warnings {
            warn!("{}", warning);
        }
        for skipped in &assembly.skipped {
            error!("Skipping post: {}", skipped);
        }

        match assembly.store_error {
            Some(ref e) => {
                error!("Could not read posts from {}: {:?}", self.root_dir, e);
                Arc::new(assembly)
            }
            None if generation != self.generation.load(Ordering::SeqCst) => Arc::new(assembly),
            None => {
                let assembly = self.cache.add(ASSEMBLY_KEY, assembly, Expire::After(Duration::minutes(CACHE_TTL_MINUTES)));
                // A write may have landed between the check and the insert
                if generation != self.generation.load(Ordering::SeqCst) {
                    self.cache.invalidate_all();
                }
                assembly
            }
        }
    }

    /// Newest first. Empty when the store cannot be read.
    pub async fn list_posts(&self) -> Vec<Post> {
        self.assemble().await.collection.list().to_vec()
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Option<Post> {
        self.assemble().await.collection.by_slug(slug).cloned()
    }

    pub async fn get_adjacent(&self, slug: &str) -> Adjacent {
        self.assemble().await.collection.adjacent(slug)
    }

    pub async fn get_all_slugs(&self) -> Vec<Slug> {
        self.assemble().await.collection.slugs()
    }

    pub async fn create_post(&self, slug: &str, text: &str) -> Result<Version, BlogError> {
        let result = self.gateway().create(slug, text, Self::today()).await;
        self.after_write("create", slug, result)
    }

    /// Creates `slug` from the store template, titled after the slug and dated today.
    pub async fn create_post_from_template(&self, slug: &str) -> Result<Version, BlogError> {
        if !crate::content::slug::is_valid_slug(slug) {
            return Err(BlogError::InvalidSlug(slug.to_string()));
        }
        let today = Self::today();
        let template = self.gateway().template(today).await?;
        let text = fill_template(&template, slug, today);
        let result = self.gateway().create(slug, &text, today).await;
        self.after_write("create", slug, result)
    }

    pub async fn update_post(&self, slug: &str, text: &str, expected: &Version) -> Result<Version, BlogError> {
        let result = self.gateway().update(slug, text, expected).await;
        self.after_write("update", slug, result)
    }

    pub async fn delete_post(&self, slug: &str, expected: &Version) -> Result<(), BlogError> {
        let result = self.gateway().delete(slug, expected).await;
        self.after_write("delete", slug, result)
    }

    pub async fn get_post_source(&self, slug: &str) -> Result<PostSource, BlogError> {
        self.gateway().source(slug).await
    }

    fn after_write<T>(&self, action: &str, slug: &str, result: Result<T, BlogError>) -> Result<T, BlogError> {
        match result {
            Ok(value) => {
                info!("Post {} {}d, invalidating cache", slug, action);
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.cache.invalidate_all();
                Ok(value)
            }
            Err(BlogError::StoreUnavailable(ref detail)) => {
                error!("Could not {} post {}: {}", action, slug, detail);
                Err(BlogError::StoreUnavailable(detail.clone()))
            }
            Err(e) => {
                warn!("Could not {} post {}: {}", action, slug, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::store::memory::MemoryStore;
    use crate::store::{StoreEntry, StoreResult, StoredFile};
    use crate::test_data::{POSITIONAL_NO_SUMMARY, POSITIONAL_POST};

    use super::*;

    fn blog(store: &Arc<MemoryStore>) -> Blog {
        Blog::new(store.clone(), "content/weeks").with_cache(true)
    }

    #[tokio::test]
    async fn test_read_surface() {
        let store = Arc::new(MemoryStore::new());
        store.insert("content/weeks/2025/2025-01-06-my-title.txt", POSITIONAL_POST);
        store.insert("content/weeks/2025/2025-01-13-second-week.txt", POSITIONAL_NO_SUMMARY);
        let blog = blog(&store);

        let posts = blog.list_posts().await;
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].slug, Slug::from("second-week"));
        assert_eq!(blog.get_post_by_slug("my-title").await.unwrap().week_number, 2);
        assert_eq!(blog.get_all_slugs().await, vec![Slug::from("second-week"), Slug::from("my-title")]);

        let adjacent = blog.get_adjacent("my-title").await;
        assert!(adjacent.previous.is_none());
        assert_eq!(adjacent.next.unwrap().slug, Slug::from("second-week"));
    }

    #[tokio::test]
    async fn test_writes_invalidate_cache() {
        let store = Arc::new(MemoryStore::new());
        store.insert("content/weeks/2025/2025-01-06-my-title.txt", POSITIONAL_POST);
        let blog = blog(&store);
        assert_eq!(blog.list_posts().await.len(), 1);

        let version = blog.create_post("second-week", POSITIONAL_NO_SUMMARY).await.unwrap();
        assert_eq!(blog.list_posts().await.len(), 2);

        let source = blog.get_post_source("second-week").await.unwrap();
        assert_eq!(source.version, version);
        assert_eq!(source.path, "content/weeks/2025/2025-01-13-second-week.txt");

        blog.delete_post("second-week", &version).await.unwrap();
        assert_eq!(blog.list_posts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        store.insert("content/weeks/2025/2025-01-06-my-title.txt", POSITIONAL_POST);
        let blog = blog(&store);

        store.set_unavailable(true);
        let assembly = blog.assemble().await;
        assert!(assembly.collection.is_empty());
        assert!(matches!(assembly.store_error, Some(BlogError::StoreUnavailable(_))));

        store.set_unavailable(false);
        assert_eq!(blog.list_posts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_conflict() {
        let store = Arc::new(MemoryStore::new());
        let v1 = store.insert("content/weeks/2025/2025-01-06-my-title.txt", POSITIONAL_POST);
        let blog = blog(&store);

        blog.update_post("my-title", "Changed\n2025-01-06\n\n\nBody", &v1).await.unwrap();
        let err = blog.update_post("my-title", "Mine\n2025-01-06\n\n\nBody", &v1).await.unwrap_err();
        assert!(matches!(err, BlogError::VersionConflict(_)));
        assert_eq!(blog.get_post_by_slug("my-title").await.unwrap().title, "Changed");
    }

    #[tokio::test]
    async fn test_create_from_template() {
        let store = Arc::new(MemoryStore::new());
        let blog = blog(&store);
        blog.create_post_from_template("back-at-it").await.unwrap();

        let post = blog.get_post_by_slug("back-at-it").await.unwrap();
        assert_eq!(post.title, "Back At It");
        assert_eq!(post.start_date, Local::now().date_naive());

        let err = blog.create_post_from_template("back-at-it").await.unwrap_err();
        assert!(matches!(err, BlogError::DuplicateSlug(_)));
        let err = blog.create_post_from_template("Bad Slug").await.unwrap_err();
        assert!(matches!(err, BlogError::InvalidSlug(_)));
    }

    /// Holds the first file read until `release` is notified.
    struct SlowReadStore {
        inner: MemoryStore,
        held: AtomicBool,
        reading: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ContentStore for SlowReadStore {
        async fn list(&self, dir: &str) -> StoreResult<Vec<StoreEntry>> {
            self.inner.list(dir).await
        }

        async fn read_file(&self, path: &str) -> StoreResult<StoredFile> {
            if !self.held.swap(true, Ordering::SeqCst) {
                self.reading.notify_one();
                self.release.notified().await;
            }
            self.inner.read_file(path).await
        }

        async fn write_file(&self, path: &str, bytes: &[u8], expected: Option<&Version>, message: &str) -> StoreResult<Version> {
            self.inner.write_file(path, bytes, expected, message).await
        }

        async fn delete_file(&self, path: &str, expected: &Version, message: &str) -> StoreResult<()> {
            self.inner.delete_file(path, expected, message).await
        }
    }

    #[tokio::test]
    async fn test_read_overlapping_write_is_not_cached() {
        let store = Arc::new(SlowReadStore {
            inner: MemoryStore::new(),
            held: AtomicBool::new(false),
            reading: Notify::new(),
            release: Notify::new(),
        });
        store.inner.insert("content/weeks/2025/2025-01-06-my-title.txt", POSITIONAL_POST);
        let blog = Blog::new(store.clone(), "content/weeks").with_cache(true);

        let read = async { blog.assemble().await.collection.len() };
        let write = async {
            store.reading.notified().await;
            blog.create_post("second-week", POSITIONAL_NO_SUMMARY).await.unwrap();
            store.release.notify_one();
        };
        let (seen, ()) = tokio::join!(read, write);

        assert_eq!(seen, 1);
        assert_eq!(blog.list_posts().await.len(), 2);
    }
}
