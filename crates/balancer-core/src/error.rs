//! Unified error types for the balancer core.

use serde::Serialize;
use thiserror::Error;

/// Main error type for balancer operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BalancerError {
    /// Input URL is structurally unroutable.
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    /// Resolved configuration cannot drive a routing decision.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistent store operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] crate::repository::RepositoryError),

    /// Cache operation failed.
    #[error("Cache error: {0}")]
    Cache(#[from] crate::cache::CacheError),
}

impl Serialize for BalancerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for balancer operations.
pub type BalancerResult<T> = Result<T, BalancerError>;
