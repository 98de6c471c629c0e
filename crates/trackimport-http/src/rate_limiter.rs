// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::time::{sleep, Duration, Instant};

use crate::error::{HttpError, Result};

/// Keeps requests to the same host at least `min_interval` apart.
///
/// Only one request is sent at a time, the caller holds the returned permit
/// until the response status is known.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    in_flight: Arc<Semaphore>,
    min_interval: Duration,
    last_request: Arc<Mutex<HashMap<String, Instant>>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            in_flight: Arc::new(Semaphore::new(1)),
            min_interval,
            last_request: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub async fn acquire(&self, host: &str) -> Result<SemaphorePermit<'_>> {
        let permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| HttpError::RateLimiterClosed)?;

        let mut last_request = self.last_request.lock().await;
        if let Some(elapsed) = last_request.get(host).map(Instant::elapsed) {
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::trace!(target: "http", host, "rate limiting: waiting {:?}", wait);
                sleep(wait).await;
            }
        }
        last_request.insert(host.to_string(), Instant::now());

        Ok(permit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spaces_requests_to_one_host() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();

        drop(limiter.acquire("musicbrainz.org").await.expect("limiter should be open"));
        assert!(start.elapsed() < Duration::from_millis(50));

        drop(limiter.acquire("musicbrainz.org").await.expect("limiter should be open"));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100), "expected >= 100ms, got {elapsed:?}");
    }

    #[tokio::test]
    async fn other_hosts_do_not_wait() {
        let limiter = RateLimiter::new(Duration::from_millis(200));
        let start = Instant::now();

        drop(limiter.acquire("api.discogs.com").await.expect("limiter should be open"));
        drop(limiter.acquire("images.amazon.com").await.expect("limiter should be open"));
        drop(limiter.acquire("gnudb.gnudb.org").await.expect("limiter should be open"));
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
