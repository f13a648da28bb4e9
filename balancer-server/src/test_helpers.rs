//! Test helpers for balancer-server unit tests.

use std::sync::Arc;

use balancer_core::resolver::ConfigResolver;
use balancer_core::testing::{MemoryCache, MemoryRepository};
use balancer_core::{SplitConfig, VideoBalancer};

use crate::state::AppState;

/// Create a minimal `AppState` backed by in-memory doubles.
///
/// Returns the repository handle as well so tests can seed records.
pub fn test_app_state() -> (AppState, Arc<MemoryRepository>) {
    let cache = Arc::new(MemoryCache::new());
    let repository = Arc::new(MemoryRepository::new());
    let defaults = SplitConfig {
        cdn_host: "cdn.example.com".to_string(),
        cdn_ratio: 9,
        origin_ratio: 1,
        is_active: true,
    };

    let resolver = ConfigResolver::new(cache, repository.clone(), defaults);
    let balancer = Arc::new(VideoBalancer::new(resolver));
    let state = AppState::new(balancer, repository.clone());

    (state, repository)
}
