// ThrottledCache: throttle window, retry on failure, single flight

use slurm_exporter::cache::ThrottledCache;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

async fn fetch(cache: &ThrottledCache<u32>, calls: &AtomicUsize) -> Result<Arc<Vec<u32>>, String> {
    cache
        .fetch_or_throttle(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst) as u32;
            Ok(vec![n])
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn calls_within_limit_hit_the_cache() {
    let cache = ThrottledCache::new(10.0);
    let calls = AtomicUsize::new(0);
    let first = fetch(&cache, &calls).await.unwrap();
    tokio::time::advance(Duration::from_secs(5)).await;
    let second = fetch(&cache, &calls).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn calls_past_limit_refresh() {
    let cache = ThrottledCache::new(1.0);
    let calls = AtomicUsize::new(0);
    fetch(&cache, &calls).await.unwrap();
    tokio::time::advance(Duration::from_millis(1500)).await;
    let second = fetch(&cache, &calls).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*second, vec![1]);
}

#[tokio::test(start_paused = true)]
async fn zero_limit_disables_memoization() {
    let cache = ThrottledCache::new(0.0);
    let calls = AtomicUsize::new(0);
    for _ in 0..3 {
        fetch(&cache, &calls).await.unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn infinite_limit_pins_first_success() {
    let cache = ThrottledCache::new(f64::INFINITY);
    let calls = AtomicUsize::new(0);
    fetch(&cache, &calls).await.unwrap();
    tokio::time::advance(Duration::from_secs(86_400)).await;
    let again = fetch(&cache, &calls).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*again, vec![0]);
}

#[tokio::test(start_paused = true)]
async fn error_never_replaces_snapshot_and_retries_immediately() {
    let cache = ThrottledCache::new(1.0);
    let calls = AtomicUsize::new(0);
    fetch(&cache, &calls).await.unwrap();
    tokio::time::advance(Duration::from_secs(2)).await;

    let err = cache
        .fetch_or_throttle(|| async { Err::<Vec<u32>, _>("scrape failed".to_string()) })
        .await
        .unwrap_err();
    assert_eq!(err, "scrape failed");

    // no backoff: the very next call runs the producer again
    let next = fetch(&cache, &calls).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*next, vec![1]);
}

#[tokio::test(start_paused = true)]
async fn empty_success_is_memoized() {
    let cache: ThrottledCache<u32> = ThrottledCache::new(10.0);
    let calls = AtomicUsize::new(0);
    for _ in 0..2 {
        let got: Result<_, String> = cache
            .fetch_or_throttle(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .await;
        assert!(got.unwrap().is_empty());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let cache = Arc::new(ThrottledCache::<u32>::new(60.0));
    let calls = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            cache
                .fetch_or_throttle(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, String>(vec![7])
                })
                .await
        }));
    }
    for h in handles {
        assert_eq!(*h.await.unwrap().unwrap(), vec![7]);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn records_refresh_duration() {
    let cache = ThrottledCache::<u32>::new(60.0);
    cache
        .fetch_or_throttle(|| async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok::<_, String>(vec![1])
        })
        .await
        .unwrap();
    assert!(cache.last_refresh_duration().await >= Duration::from_millis(30));
}
