//! Config repository trait for storage abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ConfigPatch, ConfigRecord, NewConfig};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored data violates the model invariants (e.g. a negative ratio).
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Persistent store for split configurations.
///
/// Invariant: at most one record is active at a time. `create` and
/// `activate` clear the previous active flag within the same transaction.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// The record currently flagged active, if any.
    async fn get_active(&self) -> RepoResult<Option<ConfigRecord>>;

    async fn get_by_id(&self, id: i32) -> RepoResult<Option<ConfigRecord>>;

    async fn list(&self) -> RepoResult<Vec<ConfigRecord>>;

    /// Insert a new record, deactivating the current active one.
    async fn create(&self, config: NewConfig) -> RepoResult<ConfigRecord>;

    /// Apply a partial update. Returns `None` when the record is missing.
    async fn update(&self, id: i32, patch: ConfigPatch) -> RepoResult<Option<ConfigRecord>>;

    /// Returns whether a record was deleted.
    async fn delete(&self, id: i32) -> RepoResult<bool>;

    /// Make the record the single active one. Returns `None` (leaving the
    /// store untouched) when the record is missing.
    async fn activate(&self, id: i32) -> RepoResult<Option<ConfigRecord>>;
}
