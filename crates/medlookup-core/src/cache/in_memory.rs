use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use super::{Cache, CacheResult};

/// Upper bound on any entry's lifetime; per-entry TTLs are enforced on read.
const MAX_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone)]
struct CacheEntry {
    data: String,
    /// Millis since epoch
    expires_at: u64,
}

/// In-process cache backed by moka.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
}

impl InMemoryCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: MokaCache::builder()
                .max_capacity(max_capacity)
                .time_to_live(MAX_TTL)
                .build(),
        }
    }

    fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        match self.cache.get(key).await {
            Some(entry) if Self::now_millis() >= entry.expires_at => {
                self.cache.remove(key).await;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.data)),
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at: Self::now_millis() + ttl.as_millis() as u64,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.cache.remove(key).await.is_some())
    }
}
