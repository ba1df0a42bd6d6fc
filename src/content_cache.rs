use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

/// Keyed cache of shared values. A non-caching instance accepts values and forgets them.
pub struct ContentCache<T> {
    cache: Option<RwLock<CacheMap<T>>>,
}

type CacheMap<T> = HashMap<String, CacheValue<T>>;

#[derive(Debug, Clone, Copy)]
pub enum Expire {
    Never,
    After(Duration),
}

struct CacheValue<T> {
    expire_date: DateTime<Utc>,
    value: Arc<T>,
}

impl<T> ContentCache<T> {
    pub fn new() -> Self {
        ContentCache {
            cache: Some(RwLock::new(HashMap::new())),
        }
    }

    pub fn non_caching() -> Self {
        ContentCache {
            cache: None,
        }
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    pub fn add(&self, key: &str, content: T, expire_after: Expire) -> Arc<T> {
        let value = Arc::new(content);
        if let Some(ref cache) = self.cache {
            let expire_date = match expire_after {
                Expire::Never => DateTime::<Utc>::MAX_UTC,
                Expire::After(duration) => Utc::now() + duration,
            };

            let mut cache = cache.write().unwrap_or_else(|e| e.into_inner());
            cache.insert(key.to_string(), CacheValue {
                expire_date,
                value: value.clone(),
            });
        }
        value
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let cache = self.cache.as_ref()?.read().unwrap_or_else(|e| e.into_inner());
        let cache_value = cache.get(key)?;
        if Utc::now() > cache_value.expire_date {
            return None;
        }
        Some(cache_value.value.clone())
    }

    pub fn invalidate_all(&self) {
        if let Some(ref cache) = self.cache {
            cache.write().unwrap_or_else(|e| e.into_inner()).clear();
        }
    }
}

impl<T> Default for ContentCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[test]
    fn test_content_cache_new() {
        let cache: ContentCache<String> = ContentCache::new();
        assert!(cache.is_caching());
    }

    #[test]
    fn test_content_cache_non_caching() {
        let cache: ContentCache<String> = ContentCache::non_caching();
        assert!(!cache.is_caching());
    }

    #[test]
    fn test_add_and_get_never_expires() {
        let cache = ContentCache::new();
        let content = "Hello, world!".to_string();

        let cached_content = cache.add("assembly", content.clone(), Expire::Never);
        assert_eq!(Arc::strong_count(&cached_content), 2);

        let retrieved_content = cache.get("assembly").unwrap();
        assert_eq!(retrieved_content.as_ref(), &content);
    }

    #[test]
    fn test_add_and_get_expires_after() {
        let cache = ContentCache::new();
        let content = "Hello, world!".to_string();

        let cached_content = cache.add("expiring", content.clone(), Expire::After(Duration::milliseconds(100)));

        let retrieved_content = cache.get("expiring").unwrap();
        assert_eq!(cached_content.as_ref(), &content);
        assert_eq!(retrieved_content.as_ref(), &content);

        std::thread::sleep(std::time::Duration::from_millis(200));
        assert!(cache.get("expiring").is_none());
    }

    #[test]
    fn test_invalidate_all() {
        let cache = ContentCache::new();
        cache.add("a", 1, Expire::Never);
        cache.add("b", 2, Expire::Never);
        cache.invalidate_all();
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_get_nonexistent_key() {
        let cache: ContentCache<String> = ContentCache::new();
        assert!(cache.get("nonexistent-key").is_none());
    }

    #[test]
    fn test_non_caching_behavior() {
        let cache: ContentCache<String> = ContentCache::non_caching();
        let cached_content = cache.add("non-cached", "Non-cached content".to_string(), Expire::Never);
        assert_eq!(Arc::strong_count(&cached_content), 1);
        assert!(cache.get("non-cached").is_none());
    }
}
