//! Response cache.
//!
//! The trait stores JSON strings so it stays dyn-compatible; [`CacheExt`]
//! adds typed get/set on top. Two backends: [`InMemoryCache`] (moka) and
//! [`RedisCache`].

mod in_memory;
mod redis;

pub use in_memory::InMemoryCache;
pub use self::redis::RedisCache;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::{CacheBackend, CacheConfig};
use crate::resolver::cache_key_text;

/// Key prefix for cached query responses.
pub const DEFAULT_KEY_PREFIX: &str = "med:q:";

/// Cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value cache with per-entry TTL.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Raw JSON value, `None` when absent or expired.
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a raw JSON value for `ttl`.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Remove a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;
}

/// Typed get/set over [`Cache`].
pub trait CacheExt: Cache {
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = CacheResult<Option<V>>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => Ok(Some(serde_json::from_str(&data)?)),
                None => Ok(None),
            }
        }
    }

    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value)?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}

/// Cache key for a user message.
///
/// `prefix` followed by the hex SHA-256 of the trimmed, lowercased message,
/// so messages differing only in case or outer whitespace share an entry.
pub fn cache_key(message: &str, prefix: &str) -> String {
    let digest = Sha256::digest(cache_key_text(message).as_bytes());
    format!("{}{}", prefix, hex::encode(digest))
}

/// Build the configured backend.
pub async fn connect(config: &CacheConfig) -> CacheResult<Arc<dyn Cache>> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(InMemoryCache::new(config.max_capacity))),
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                CacheError::Backend("cache.redis_url is required for the redis backend".into())
            })?;
            Ok(Arc::new(RedisCache::connect(url).await?))
        }
    }
}
