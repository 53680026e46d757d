// Fetcher: scrape -> parse -> cache, error accounting

mod common;

use common::{StaticScraper, counter};
use slurm_exporter::error::FetchError;
use slurm_exporter::fetcher::Fetcher;
use slurm_exporter::models::{JobRecord, NodeRecord};
use slurm_exporter::parse::{self, ParseFn};
use std::sync::atomic::Ordering;

fn node_fetcher(scraper: StaticScraper, limit: f64) -> Fetcher<NodeRecord, StaticScraper> {
    Fetcher::new(
        "nodes",
        scraper,
        parse::nodes::parse_node_json as ParseFn<NodeRecord>,
        limit,
        counter(),
    )
}

#[tokio::test]
async fn test_fetch_parses_and_caches() {
    let fetcher = node_fetcher(StaticScraper::fixture("sinfo_out.json"), 60.0);
    let first = fetcher.fetch_metrics().await.unwrap();
    let second = fetcher.fetch_metrics().await.unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(fetcher.scrape_error().get(), 0);
    assert_eq!(fetcher.domain(), "nodes");
}

#[tokio::test]
async fn test_scrape_failure_counts_once() {
    let fetcher = node_fetcher(StaticScraper::failing("sinfo: command not found"), 0.0);
    let err = fetcher.fetch_metrics().await.unwrap_err();
    assert!(matches!(err, FetchError::Scrape(_)));
    assert_eq!(fetcher.scrape_error().get(), 1);
    fetcher.fetch_metrics().await.unwrap_err();
    assert_eq!(fetcher.scrape_error().get(), 2);
}

#[tokio::test]
async fn test_parse_failure_surfaces() {
    let fetcher = node_fetcher(StaticScraper::ok("garbage"), 0.0);
    let err = fetcher.fetch_metrics().await.unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
    assert_eq!(fetcher.scrape_error().get(), 1);
}

#[tokio::test]
async fn test_row_errors_do_not_fail_the_fetch() {
    let fetcher = Fetcher::new(
        "jobs",
        StaticScraper::fixture("squeue_fallback.txt"),
        parse::jobs::parse_job_fallback as ParseFn<JobRecord>,
        10.0,
        counter(),
    );
    let jobs = fetcher.fetch_metrics().await.unwrap();
    assert_eq!(jobs.len(), 3);
    assert_eq!(fetcher.scrape_error().get(), 3);
}

#[tokio::test]
async fn test_zero_limit_scrapes_every_call() {
    let scraper = StaticScraper::fixture("sinfo_out.json");
    let calls = scraper.call_counter();
    let fetcher = node_fetcher(scraper, 0.0);
    for _ in 0..3 {
        fetcher.fetch_metrics().await.unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(fetcher.scrape_duration().as_millis(), 5);
}

#[tokio::test]
async fn test_within_limit_scrapes_once() {
    let scraper = StaticScraper::fixture("sinfo_out.json");
    let calls = scraper.call_counter();
    let fetcher = node_fetcher(scraper, 60.0);
    for _ in 0..3 {
        fetcher.fetch_metrics().await.unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
