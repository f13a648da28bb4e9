//! In-memory doubles for the cache and repository traits.
//!
//! Compiled for this crate's own tests and, behind the `test-utils`
//! feature, for downstream test code.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::cache::{CacheError, ConfigCache};
use crate::models::{ConfigPatch, ConfigRecord, NewConfig};
use crate::repository::{ConfigRepository, RepoResult, RepositoryError};

/// In-memory cache double. TTLs are accepted but entries never expire.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry, bypassing the trait.
    pub fn insert(&self, key: &str, value: Vec<u8>) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_string(), value);
    }

    /// Inspect an entry without going through the trait.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl ConfigCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self
            .entries
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .cloned())
    }

    async fn setex(&self, key: &str, _ttl_secs: u64, value: &[u8]) -> Result<(), CacheError> {
        self.insert(key, value.to_vec());
        Ok(())
    }
}

/// Cache double whose every call fails.
pub struct FailingCache;

#[async_trait]
impl ConfigCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Unavailable("cache is down".to_string()))
    }

    async fn setex(&self, _key: &str, _ttl_secs: u64, _value: &[u8]) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("cache is down".to_string()))
    }
}

/// In-memory repository double with the same single-active discipline as
/// the Postgres implementation.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<MemoryRepoInner>,
}

#[derive(Default)]
struct MemoryRepoInner {
    records: Vec<ConfigRecord>,
    next_id: i32,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigRepository for MemoryRepository {
    async fn get_active(&self) -> RepoResult<Option<ConfigRecord>> {
        let inner = self.inner.lock().expect("repository lock poisoned");
        Ok(inner.records.iter().find(|r| r.is_active).cloned())
    }

    async fn get_by_id(&self, id: i32) -> RepoResult<Option<ConfigRecord>> {
        let inner = self.inner.lock().expect("repository lock poisoned");
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<ConfigRecord>> {
        let inner = self.inner.lock().expect("repository lock poisoned");
        Ok(inner.records.clone())
    }

    async fn create(&self, config: NewConfig) -> RepoResult<ConfigRecord> {
        let mut inner = self.inner.lock().expect("repository lock poisoned");
        for record in &mut inner.records {
            record.is_active = false;
        }
        inner.next_id += 1;
        let record = ConfigRecord {
            id: inner.next_id,
            cdn_host: config.cdn_host,
            cdn_ratio: config.cdn_ratio,
            origin_ratio: config.origin_ratio,
            is_active: config.is_active,
            created_at: Utc::now(),
            updated_at: None,
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: i32, patch: ConfigPatch) -> RepoResult<Option<ConfigRecord>> {
        let mut inner = self.inner.lock().expect("repository lock poisoned");
        let Some(record) = inner.records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(cdn_host) = patch.cdn_host {
            record.cdn_host = cdn_host;
        }
        if let Some(cdn_ratio) = patch.cdn_ratio {
            record.cdn_ratio = cdn_ratio;
        }
        if let Some(origin_ratio) = patch.origin_ratio {
            record.origin_ratio = origin_ratio;
        }
        if let Some(is_active) = patch.is_active {
            record.is_active = is_active;
        }
        record.updated_at = Some(Utc::now());
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        let mut inner = self.inner.lock().expect("repository lock poisoned");
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        Ok(inner.records.len() < before)
    }

    async fn activate(&self, id: i32) -> RepoResult<Option<ConfigRecord>> {
        let mut inner = self.inner.lock().expect("repository lock poisoned");
        if !inner.records.iter().any(|r| r.id == id) {
            return Ok(None);
        }
        for record in &mut inner.records {
            record.is_active = record.id == id;
            if record.is_active {
                record.updated_at = Some(Utc::now());
            }
        }
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }
}

/// Repository double whose every call fails.
pub struct FailingRepository;

#[async_trait]
impl ConfigRepository for FailingRepository {
    async fn get_active(&self) -> RepoResult<Option<ConfigRecord>> {
        Err(RepositoryError::Database("store is down".to_string()))
    }

    async fn get_by_id(&self, _id: i32) -> RepoResult<Option<ConfigRecord>> {
        Err(RepositoryError::Database("store is down".to_string()))
    }

    async fn list(&self) -> RepoResult<Vec<ConfigRecord>> {
        Err(RepositoryError::Database("store is down".to_string()))
    }

    async fn create(&self, _config: NewConfig) -> RepoResult<ConfigRecord> {
        Err(RepositoryError::Database("store is down".to_string()))
    }

    async fn update(&self, _id: i32, _patch: ConfigPatch) -> RepoResult<Option<ConfigRecord>> {
        Err(RepositoryError::Database("store is down".to_string()))
    }

    async fn delete(&self, _id: i32) -> RepoResult<bool> {
        Err(RepositoryError::Database("store is down".to_string()))
    }

    async fn activate(&self, _id: i32) -> RepoResult<Option<ConfigRecord>> {
        Err(RepositoryError::Database("store is down".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, active: bool) -> NewConfig {
        NewConfig {
            cdn_host: host.to_string(),
            cdn_ratio: 9,
            origin_ratio: 1,
            is_active: active,
        }
    }

    #[tokio::test]
    async fn create_keeps_a_single_active_record() {
        let repo = MemoryRepository::new();
        let first = repo.create(config("cdn.a", true)).await.expect("create");
        let second = repo.create(config("cdn.b", true)).await.expect("create");

        let active = repo.get_active().await.expect("get_active").expect("active");
        assert_eq!(active.id, second.id);

        let first = repo
            .get_by_id(first.id)
            .await
            .expect("get_by_id")
            .expect("record");
        assert!(!first.is_active);
    }

    #[tokio::test]
    async fn activate_switches_the_active_record() {
        let repo = MemoryRepository::new();
        let first = repo.create(config("cdn.a", true)).await.expect("create");
        repo.create(config("cdn.b", true)).await.expect("create");

        let activated = repo
            .activate(first.id)
            .await
            .expect("activate")
            .expect("record exists");
        assert!(activated.is_active);

        let actives: Vec<_> = repo
            .list()
            .await
            .expect("list")
            .into_iter()
            .filter(|r| r.is_active)
            .collect();
        assert_eq!(actives.len(), 1);
        assert_eq!(actives[0].id, first.id);
    }

    #[tokio::test]
    async fn activate_unknown_id_leaves_store_untouched() {
        let repo = MemoryRepository::new();
        let existing = repo.create(config("cdn.a", true)).await.expect("create");

        assert!(repo.activate(999).await.expect("activate").is_none());

        let active = repo.get_active().await.expect("get_active").expect("active");
        assert_eq!(active.id, existing.id);
    }
}
