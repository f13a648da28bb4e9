//! Deterministic CDN/origin split decision and the shared request counter.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Routing target for a balanced request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteTarget {
    Cdn,
    Origin,
}

impl RouteTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cdn => "cdn",
            Self::Origin => "origin",
        }
    }
}

/// Map a counter value and a ratio pair onto a routing target.
///
/// Bucketed round-robin: across `cdn_ratio + origin_ratio` consecutive
/// counter values, the lowest `origin_ratio` residues of each cycle route
/// to origin and the rest to the CDN. Pure function; the caller increments
/// the counter exactly once per decision and passes the pre-increment
/// value.
///
/// Precondition: `cdn_ratio + origin_ratio > 0`.
pub fn decide(counter: u64, cdn_ratio: u32, origin_ratio: u32) -> RouteTarget {
    let total = u64::from(cdn_ratio) + u64::from(origin_ratio);
    debug_assert!(total > 0, "ratio total must be positive");

    if counter % total < u64::from(origin_ratio) {
        RouteTarget::Origin
    } else {
        RouteTarget::Cdn
    }
}

/// Process-wide request counter.
///
/// `next` hands out the pre-increment value, so the first decision after
/// startup (or a reset) sees 0. Not persisted across restarts.
#[derive(Debug, Default)]
pub struct RequestCounter(AtomicU64);

impl RequestCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Claim the next counter value. Concurrent callers never observe the
    /// same value and no increment is ever lost.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Current value, i.e. the number of decisions made since the last
    /// reset. Exposed as an admin statistic.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Set the counter back to 0.
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_matches_ratio_pair() {
        let (cdn, origin) = (9, 1);
        let total = cdn + origin;
        let origins = (0..u64::from(total))
            .filter(|&c| decide(c, cdn, origin) == RouteTarget::Origin)
            .count();
        assert_eq!(origins, origin as usize);

        let (cdn, origin) = (3, 7);
        let cdns = (0..10u64)
            .filter(|&c| decide(c, cdn, origin) == RouteTarget::Cdn)
            .count();
        assert_eq!(cdns, 3);
    }

    #[test]
    fn origin_occupies_lowest_residues() {
        for counter in 0..3u64 {
            assert_eq!(decide(counter, 7, 3), RouteTarget::Origin);
        }
        for counter in 3..10u64 {
            assert_eq!(decide(counter, 7, 3), RouteTarget::Cdn);
        }
        // next cycle starts over
        assert_eq!(decide(10, 7, 3), RouteTarget::Origin);
    }

    #[test]
    fn decide_is_deterministic() {
        for counter in 0..100u64 {
            assert_eq!(decide(counter, 9, 1), decide(counter, 9, 1));
        }
    }

    #[test]
    fn counter_hands_out_pre_increment_values() {
        let counter = RequestCounter::new();
        assert_eq!(counter.next(), 0);
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn counter_reset_restarts_sequence() {
        let counter = RequestCounter::new();
        counter.next();
        counter.next();
        counter.reset();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.next(), 0);
    }

    #[tokio::test]
    async fn concurrent_increments_never_collide() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let counter = Arc::new(RequestCounter::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                (0..100).map(|_| counter.next()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.await.expect("task panicked") {
                assert!(seen.insert(value), "duplicate counter value {value}");
            }
        }
        assert_eq!(seen.len(), 800);
        assert_eq!(counter.get(), 800);
    }
}
