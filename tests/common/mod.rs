// Shared test helpers

#![allow(dead_code)]

use prometheus::IntCounter;
use slurm_exporter::error::ScrapeError;
use slurm_exporter::scraper::ByteScraper;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).unwrap_or_else(|e| panic!("fixture {name}: {e}"))
}

pub fn counter() -> IntCounter {
    IntCounter::new("test_scrape_error", "test scrape errors").unwrap()
}

/// Serves canned bytes (or an error) and counts calls.
pub struct StaticScraper {
    body: Result<Vec<u8>, String>,
    calls: Arc<AtomicUsize>,
}

impl StaticScraper {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: Ok(body.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fixture(name: &str) -> Self {
        Self::ok(fixture(name))
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            body: Err(msg.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Call count that stays readable after the scraper moves into a fetcher.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl ByteScraper for StaticScraper {
    async fn fetch_raw_bytes(&self) -> Result<Vec<u8>, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body.clone().map_err(ScrapeError::Source)
    }

    fn duration(&self) -> Duration {
        Duration::from_millis(5)
    }
}

/// Shell command that prints a fixture, for tests going through `CliScraper`.
pub fn cat_fixture(name: &str) -> String {
    format!("cat {}", fixture_path(name))
}
