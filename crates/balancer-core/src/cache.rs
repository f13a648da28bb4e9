//! Config cache abstraction and the Redis backend.

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;

/// Fixed cache key holding the serialized active configuration.
pub const CONFIG_CACHE_KEY: &str = "balancer_config";

/// Seconds a cached configuration stays valid.
pub const CONFIG_CACHE_TTL_SECS: u64 = 300;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Minimal capability interface for the config cache.
///
/// Anything that can fetch bytes by key and store them with an expiry can
/// back the resolver. Production uses Redis; tests substitute an in-memory
/// double.
#[async_trait]
pub trait ConfigCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    async fn setex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> Result<(), CacheError>;
}

/// Redis-backed config cache.
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    /// Connect and build a managed connection. The manager reconnects in
    /// the background, so a dropped connection surfaces as a failed call
    /// rather than a permanently dead cache.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ConfigCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let bytes: Option<Vec<u8>> = conn.get(key).await?;
        Ok(bytes)
    }

    async fn setex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }
}

/// Cache that stores nothing and never hits.
///
/// Used when the cache backend is unreachable at startup: the resolver then
/// always falls through to the persistent store.
pub struct NullCache;

#[async_trait]
impl ConfigCache for NullCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn setex(&self, _key: &str, _ttl_secs: u64, _value: &[u8]) -> Result<(), CacheError> {
        Ok(())
    }
}
