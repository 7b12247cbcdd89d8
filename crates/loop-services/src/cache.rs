//! Response cache in front of a routing engine.
//!
//! Editing tends to resubmit identical waypoint lists (undoing a drag, re-generating
//! with the same parameters), so engine answers are kept for a while.

use async_trait::async_trait;
use dashmap::DashMap;
use loop_core::{RouteClient, RouteError, RouteRequest, RouteResult};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedRoute {
    fetched_at: Instant,
    // `None` records a definite "no route" answer.
    route: Option<RouteResult>,
}

/// Cache key: profile, preference and waypoints rounded to ~1 cm.
type RouteKey = (String, String, Vec<(i64, i64)>);

fn route_key(request: &RouteRequest) -> RouteKey {
    let points = request
        .coordinates()
        .iter()
        .map(|point| {
            (
                (point.lon * 1e7).round() as i64,
                (point.lat * 1e7).round() as i64,
            )
        })
        .collect();
    (
        request.profile.as_str().to_string(),
        request.preference.as_str().to_string(),
        points,
    )
}

/// Wraps any `RouteClient`; transport errors are never cached.
pub struct CachedRouteClient<C> {
    inner: C,
    entries: DashMap<RouteKey, CachedRoute>,
    max_entries: usize,
    ttl: Duration,
}

impl<C: RouteClient> CachedRouteClient<C> {
    pub fn new(inner: C, max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget expired answers, then the oldest ones while over capacity.
    fn evict(&self) {
        self.entries.retain(|_, entry| entry.fetched_at.elapsed() <= self.ttl);
        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.fetched_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl<C: RouteClient> RouteClient for CachedRouteClient<C> {
    async fn route(&self, request: &RouteRequest) -> Result<Option<RouteResult>, RouteError> {
        let key = route_key(request);
        if let Some(entry) = self.entries.get(&key) {
            if entry.fetched_at.elapsed() <= self.ttl {
                tracing::debug!("Route cache hit");
                return Ok(entry.route.clone());
            }
        }

        let route = self.inner.route(request).await?;
        self.entries.insert(
            key,
            CachedRoute {
                fetched_at: Instant::now(),
                route: route.clone(),
            },
        );
        self.evict();
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loop_core::{Coordinate, RoutePreference, TravelProfile};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counting {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl RouteClient for Counting {
        async fn route(&self, request: &RouteRequest) -> Result<Option<RouteResult>, RouteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RouteError::NetworkFailure("down".into()));
            }
            Ok(Some(RouteResult::from_path(request.coordinates().to_vec())))
        }
    }

    fn request(lat: f64) -> RouteRequest {
        RouteRequest::new(
            vec![Coordinate::new(10.0, 54.0), Coordinate::new(10.0, lat)],
            TravelProfile::FootHiking,
            RoutePreference::Shortest,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn repeated_request_hits_cache() {
        let inner = Arc::new(Counting::default());
        let cached = CachedRouteClient::new(inner.clone(), 8, Duration::from_secs(60));

        let first = cached.route(&request(54.01)).await.unwrap();
        let second = cached.route(&request(54.01)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cached.route(&request(54.02)).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let inner = Arc::new(Counting {
            fail: true,
            ..Counting::default()
        });
        let cached = CachedRouteClient::new(inner.clone(), 8, Duration::from_secs(60));
        assert!(cached.route(&request(54.01)).await.is_err());
        assert!(cached.route(&request(54.01)).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn cache_is_bounded() {
        let inner = Arc::new(Counting::default());
        let cached = CachedRouteClient::new(inner, 2, Duration::from_secs(60));
        for step in 1..=5 {
            cached.route(&request(54.0 + step as f64 * 0.01)).await.unwrap();
        }
        assert_eq!(cached.len(), 2);
    }

    #[tokio::test]
    async fn oldest_answer_is_evicted_first() {
        let inner = Arc::new(Counting::default());
        let cached = CachedRouteClient::new(inner.clone(), 2, Duration::from_secs(60));
        for lat in [54.01, 54.02, 54.03] {
            cached.route(&request(lat)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(3)).await;
        }
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);

        // The two newest are still served from the cache.
        cached.route(&request(54.03)).await.unwrap();
        cached.route(&request(54.02)).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);

        cached.route(&request(54.01)).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn expired_answers_are_refetched_and_dropped() {
        let inner = Arc::new(Counting::default());
        let cached = CachedRouteClient::new(inner.clone(), 8, Duration::from_millis(10));
        cached.route(&request(54.01)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        cached.route(&request(54.02)).await.unwrap();
        assert_eq!(cached.len(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        cached.route(&request(54.02)).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }
}
