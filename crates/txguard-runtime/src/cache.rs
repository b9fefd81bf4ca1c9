//! Explanation cache.
//!
//! Rule messages repeat heavily across a batch (most are fixed strings), so
//! explanations are cached by the exact error text.

use moka::future::Cache;
use std::time::Duration;

use crate::config::CacheConfig;

/// In-memory explanation cache using moka.
pub struct ExplanationCache {
    cache: Cache<String, String>,
}

impl ExplanationCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.ttl)
    }

    /// Cached explanation for an error message.
    pub async fn get(&self, error: &str) -> Option<String> {
        self.cache.get(error).await
    }

    pub async fn insert(&self, error: impl Into<String>, explanation: impl Into<String>) {
        self.cache.insert(error.into(), explanation.into()).await;
    }
}

impl Default for ExplanationCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_hit_and_miss() {
        let cache = ExplanationCache::default();
        let error = "Reported Amount is required";

        assert!(cache.get(error).await.is_none());

        cache.insert(error, "Upstream feed omitted the field.").await;
        assert_eq!(
            cache.get(error).await.as_deref(),
            Some("Upstream feed omitted the field.")
        );

        // Keys are exact text.
        assert!(cache.get("Reported Amount is required ").await.is_none());
    }
}
