//! Application State
//!
//! Holds shared state for the server: the balancer and the config store.

use std::sync::Arc;

use balancer_core::repository::ConfigRepository;
use balancer_core::VideoBalancer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    balancer: Arc<VideoBalancer>,
    repository: Arc<dyn ConfigRepository>,
}

impl AppState {
    pub fn new(balancer: Arc<VideoBalancer>, repository: Arc<dyn ConfigRepository>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                balancer,
                repository,
            }),
        }
    }

    pub fn balancer(&self) -> &VideoBalancer {
        &self.inner.balancer
    }

    pub fn repository(&self) -> &dyn ConfigRepository {
        self.inner.repository.as_ref()
    }
}
