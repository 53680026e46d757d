// Throttled single-flight cache in front of a domain scrape

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct CacheEntry<T> {
    refreshed_at: Option<Instant>,
    records: Arc<Vec<T>>,
    duration: Duration,
}

/// Memoizes the last successful snapshot for `limit` seconds. Refreshes run
/// under the lock, so concurrent callers wait for the one in flight.
#[derive(Debug)]
pub struct ThrottledCache<T> {
    limit: f64,
    entry: Mutex<CacheEntry<T>>,
}

impl<T> ThrottledCache<T> {
    /// `limit` is in seconds; 0 disables memoization and infinity never refreshes
    /// after the first success.
    pub fn new(limit: f64) -> Self {
        Self {
            limit,
            entry: Mutex::new(CacheEntry {
                refreshed_at: None,
                records: Arc::new(Vec::new()),
                duration: Duration::ZERO,
            }),
        }
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// Returns the memoized snapshot while it is fresh, otherwise runs
    /// `producer`. A failed producer leaves the previous snapshot and its
    /// timestamp in place, so the next call retries.
    pub async fn fetch_or_throttle<F, Fut, E>(&self, producer: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let mut entry = self.entry.lock().await;
        if let Some(at) = entry.refreshed_at {
            if at.elapsed().as_secs_f64() < self.limit {
                return Ok(entry.records.clone());
            }
        }
        let start = Instant::now();
        let records = Arc::new(producer().await?);
        entry.duration = start.elapsed();
        entry.records = records.clone();
        entry.refreshed_at = Some(Instant::now());
        Ok(records)
    }

    /// How long the last successful refresh took.
    pub async fn last_refresh_duration(&self) -> Duration {
        self.entry.lock().await.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_snapshot() {
        let cache = ThrottledCache::new(1.0);
        let first: Result<_, &str> = cache.fetch_or_throttle(|| async { Ok(vec![1, 2]) }).await;
        assert_eq!(*first.unwrap(), vec![1, 2]);

        tokio::time::advance(Duration::from_secs(2)).await;
        let failed = cache.fetch_or_throttle(|| async { Err("boom") }).await;
        assert_eq!(failed.unwrap_err(), "boom");

        let calls = AtomicUsize::new(0);
        let again: Result<_, &str> = cache
            .fetch_or_throttle(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![3])
            })
            .await;
        assert_eq!(*again.unwrap(), vec![3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
