//! Routing orchestrator: parse, resolve, decide, build the redirect URL.

use tracing::warn;

use crate::decision::{decide, RequestCounter, RouteTarget};
use crate::error::{BalancerError, BalancerResult};
use crate::models::{ParsedVideoUrl, SplitConfig};
use crate::parser::parse_video_url;
use crate::resolver::ConfigResolver;

/// Outcome of a balance operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    /// URL the request should be redirected to.
    pub url: String,
    pub target: RouteTarget,
}

/// Balances video requests between the CDN mirror and the origin servers.
pub struct VideoBalancer {
    resolver: ConfigResolver,
    counter: RequestCounter,
}

impl VideoBalancer {
    pub fn new(resolver: ConfigResolver) -> Self {
        Self {
            resolver,
            counter: RequestCounter::new(),
        }
    }

    /// Compute the redirect target for a video URL.
    ///
    /// A parse failure is the one hard error: it propagates even though the
    /// origin fallback would not need the parsed fields, so an unroutable
    /// URL is rejected rather than bounced back to origin unchecked. Every
    /// fault after parsing degrades to origin routing instead (fail open).
    pub async fn balance(&self, video_url: &str) -> BalancerResult<RouteDecision> {
        let parsed = parse_video_url(video_url)?;

        let config = self.resolver.resolve().await;
        let counter = self.counter.next();

        match route(counter, &config, &parsed, video_url) {
            Ok(decision) => Ok(decision),
            Err(err) => {
                warn!("falling back to origin due to configuration error: {err}");
                Ok(RouteDecision {
                    url: video_url.to_string(),
                    target: RouteTarget::Origin,
                })
            }
        }
    }

    /// Number of balance decisions made since startup or the last reset.
    pub fn request_count(&self) -> u64 {
        self.counter.get()
    }

    /// Reset the request counter; the next decision sees 0 again.
    pub fn reset_counter(&self) {
        self.counter.reset();
    }
}

fn route(
    counter: u64,
    config: &SplitConfig,
    parsed: &ParsedVideoUrl,
    original: &str,
) -> BalancerResult<RouteDecision> {
    if config.total_ratio() == 0 {
        return Err(BalancerError::Config(format!(
            "ratio total is zero (cdn={}, origin={})",
            config.cdn_ratio, config.origin_ratio
        )));
    }

    let target = decide(counter, config.cdn_ratio, config.origin_ratio);
    let url = match target {
        RouteTarget::Origin => original.to_string(),
        RouteTarget::Cdn => cdn_url(&config.cdn_host, &parsed.server, &parsed.path),
    };

    Ok(RouteDecision { url, target })
}

/// CDN URLs take the shape `http://{cdn_host}/{server}{path}`.
fn cdn_url(cdn_host: &str, server: &str, path: &str) -> String {
    format!("http://{cdn_host}/{server}{path}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{FailingCache, FailingRepository, MemoryCache, MemoryRepository};

    const VIDEO_URL: &str = "http://s1.origin-cluster/video/1488/xcg2djHckad.m3u8";

    fn balancer_with_defaults(defaults: SplitConfig) -> VideoBalancer {
        let resolver = ConfigResolver::new(
            Arc::new(MemoryCache::new()),
            Arc::new(MemoryRepository::new()),
            defaults,
        );
        VideoBalancer::new(resolver)
    }

    fn nine_to_one() -> SplitConfig {
        SplitConfig {
            cdn_host: "cdn.example.com".to_string(),
            cdn_ratio: 9,
            origin_ratio: 1,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn first_call_routes_origin_then_nine_cdn() {
        let balancer = balancer_with_defaults(nine_to_one());

        let first = balancer.balance(VIDEO_URL).await.expect("balance");
        assert_eq!(first.target, RouteTarget::Origin);
        assert_eq!(first.url, VIDEO_URL);

        for call in 2..=10 {
            let decision = balancer.balance(VIDEO_URL).await.expect("balance");
            assert_eq!(decision.target, RouteTarget::Cdn, "call {call}");
            assert_eq!(
                decision.url,
                "http://cdn.example.com/s1/video/1488/xcg2djHckad.m3u8"
            );
        }

        let eleventh = balancer.balance(VIDEO_URL).await.expect("balance");
        assert_eq!(eleventh.target, RouteTarget::Origin);
    }

    #[tokio::test]
    async fn reset_reproduces_first_call_outcome() {
        let balancer = balancer_with_defaults(nine_to_one());

        for _ in 0..5 {
            balancer.balance(VIDEO_URL).await.expect("balance");
        }
        balancer.reset_counter();

        let decision = balancer.balance(VIDEO_URL).await.expect("balance");
        assert_eq!(decision.target, RouteTarget::Origin);
    }

    #[tokio::test]
    async fn invalid_url_is_a_hard_error() {
        let balancer = balancer_with_defaults(nine_to_one());

        let err = balancer
            .balance("http://localhost/video/1/a.m3u8")
            .await
            .unwrap_err();
        assert!(matches!(err, BalancerError::InvalidUrl(_)));

        // the failed call never claimed a counter value
        assert_eq!(balancer.request_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_backends_still_balance_on_defaults() {
        let resolver = ConfigResolver::new(
            Arc::new(FailingCache),
            Arc::new(FailingRepository),
            nine_to_one(),
        );
        let balancer = VideoBalancer::new(resolver);

        let decision = balancer.balance(VIDEO_URL).await.expect("balance");
        assert_eq!(decision.target, RouteTarget::Origin);
        assert_eq!(decision.url, VIDEO_URL);
    }

    #[tokio::test]
    async fn zero_ratio_total_fails_open_to_origin() {
        let broken = SplitConfig {
            cdn_host: "cdn.example.com".to_string(),
            cdn_ratio: 0,
            origin_ratio: 0,
            is_active: true,
        };
        let balancer = balancer_with_defaults(broken);

        let decision = balancer.balance(VIDEO_URL).await.expect("balance");
        assert_eq!(decision.target, RouteTarget::Origin);
        assert_eq!(decision.url, VIDEO_URL);
    }

    #[tokio::test]
    async fn request_count_tracks_decisions() {
        let balancer = balancer_with_defaults(nine_to_one());
        assert_eq!(balancer.request_count(), 0);

        balancer.balance(VIDEO_URL).await.expect("balance");
        balancer.balance(VIDEO_URL).await.expect("balance");
        assert_eq!(balancer.request_count(), 2);
    }
}
