//! Balancer Server - Video Traffic Balancer Daemon
//!
//! A pure Rust HTTP server that:
//! - Redirects video playback requests to a CDN mirror or the origin on /
//! - Exposes counter statistics and a reset hook on /stats and /reset
//! - Provides a REST API for split configurations on /srv/config
//!
//! Access via: http://localhost:8080

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod api;
mod config;
mod state;
#[cfg(test)]
mod test_helpers;

use balancer_core::cache::{ConfigCache, NullCache, RedisCache};
use balancer_core::config_pg::PostgresConfigRepository;
use balancer_core::resolver::ConfigResolver;
use balancer_core::VideoBalancer;

use config::ServerConfig;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let server_config = ServerConfig::from_env();

    info!("🚀 Balancer server starting on port {}...", server_config.port);

    let repository = PostgresConfigRepository::connect(&server_config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
    repository
        .run_migrations()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    info!("✅ Database ready");

    // A dead cache only costs the fast path; the resolver falls through to
    // the store, so startup continues without Redis.
    let cache: Arc<dyn ConfigCache> = match RedisCache::connect(&server_config.redis_url).await {
        Ok(cache) => {
            info!("✅ Config cache connected");
            Arc::new(cache)
        }
        Err(e) => {
            warn!("⚠️ Config cache unavailable, continuing without it: {e}");
            Arc::new(NullCache)
        }
    };

    let repository = Arc::new(repository);
    let resolver = ConfigResolver::new(cache, repository.clone(), server_config.default_split());
    let balancer = Arc::new(VideoBalancer::new(resolver));

    let state = AppState::new(balancer, repository);

    let app = api::router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("🔀 Balance endpoint at http://{}/?video=...", addr);
    info!("🔧 Admin API at http://{}/srv/config", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
