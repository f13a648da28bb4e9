//! Configuration resolution: cache, persistent store, hardcoded defaults.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{ConfigCache, CONFIG_CACHE_KEY, CONFIG_CACHE_TTL_SECS};
use crate::models::SplitConfig;
use crate::repository::ConfigRepository;

/// Upper bound on a single cache or store call; a hang becomes a tier
/// failure instead of stalling the balance operation.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of one resolution tier.
enum Lookup {
    Hit(SplitConfig),
    Miss,
    Failed,
}

/// Resolves the active split configuration.
///
/// Tiers are consulted in order: cache, persistent store, hardcoded
/// defaults. A failure in any tier is logged and falls through to the
/// next, so `resolve` has no externally observable failure mode. The
/// cache and store lookups are independent best-effort calls; no
/// transaction spans them.
pub struct ConfigResolver {
    cache: Arc<dyn ConfigCache>,
    store: Arc<dyn ConfigRepository>,
    defaults: SplitConfig,
}

impl ConfigResolver {
    pub fn new(
        cache: Arc<dyn ConfigCache>,
        store: Arc<dyn ConfigRepository>,
        defaults: SplitConfig,
    ) -> Self {
        Self {
            cache,
            store,
            defaults,
        }
    }

    /// Resolve the active configuration. Never fails.
    pub async fn resolve(&self) -> SplitConfig {
        if let Lookup::Hit(config) = self.from_cache().await {
            return config;
        }
        if let Lookup::Hit(config) = self.from_store().await {
            return config;
        }

        debug!("no active configuration available, using defaults");
        self.defaults.clone()
    }

    async fn from_cache(&self) -> Lookup {
        let lookup = tokio::time::timeout(LOOKUP_TIMEOUT, self.cache.get(CONFIG_CACHE_KEY)).await;
        let bytes = match lookup {
            Ok(Ok(Some(bytes))) => bytes,
            Ok(Ok(None)) => return Lookup::Miss,
            Ok(Err(err)) => {
                warn!("config cache read failed: {err}");
                return Lookup::Failed;
            }
            Err(_) => {
                warn!("config cache read timed out");
                return Lookup::Failed;
            }
        };

        match serde_json::from_slice::<SplitConfig>(&bytes) {
            Ok(config) => {
                debug!("config cache hit: {config:?}");
                Lookup::Hit(config)
            }
            Err(err) => {
                warn!("cached configuration did not deserialize: {err}");
                Lookup::Failed
            }
        }
    }

    async fn from_store(&self) -> Lookup {
        let lookup = tokio::time::timeout(LOOKUP_TIMEOUT, self.store.get_active()).await;
        let record = match lookup {
            Ok(Ok(Some(record))) => record,
            Ok(Ok(None)) => return Lookup::Miss,
            Ok(Err(err)) => {
                warn!("active configuration query failed: {err}");
                return Lookup::Failed;
            }
            Err(_) => {
                warn!("active configuration query timed out");
                return Lookup::Failed;
            }
        };

        let config = record.split_config();
        self.repopulate_cache(&config).await;
        Lookup::Hit(config)
    }

    /// Best-effort cache write; a failure never affects the resolved value.
    async fn repopulate_cache(&self, config: &SplitConfig) {
        let bytes = match serde_json::to_vec(config) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("failed to serialize configuration for caching: {err}");
                return;
            }
        };

        let write = self.cache.setex(CONFIG_CACHE_KEY, CONFIG_CACHE_TTL_SECS, &bytes);
        match tokio::time::timeout(LOOKUP_TIMEOUT, write).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("failed to write config cache: {err}"),
            Err(_) => warn!("config cache write timed out"),
        }
    }
}
