// One domain's scrape -> parse -> cache pipeline

use std::sync::Arc;
use std::time::Duration;

use prometheus::IntCounter;
use tracing::instrument;

use crate::cache::ThrottledCache;
use crate::error::FetchError;
use crate::parse::ParseFn;
use crate::scraper::{ByteScraper, CliScraper};

pub struct Fetcher<T, S = CliScraper> {
    domain: &'static str,
    scraper: S,
    parse: ParseFn<T>,
    cache: ThrottledCache<T>,
    errors: IntCounter,
}

impl<T, S> Fetcher<T, S>
where
    T: Send + Sync,
    S: ByteScraper,
{
    pub fn new(
        domain: &'static str,
        scraper: S,
        parse: ParseFn<T>,
        poll_limit: f64,
        errors: IntCounter,
    ) -> Self {
        Self {
            domain,
            scraper,
            parse,
            cache: ThrottledCache::new(poll_limit),
            errors,
        }
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// Latest snapshot, refreshed at most once per poll limit. A failed
    /// refresh counts once against the domain error counter.
    #[instrument(skip(self), fields(domain = self.domain))]
    pub async fn fetch_metrics(&self) -> Result<Arc<Vec<T>>, FetchError> {
        let result = self
            .cache
            .fetch_or_throttle(|| async {
                let bytes = self.scraper.fetch_raw_bytes().await?;
                let records = (self.parse)(&bytes, &self.errors)?;
                tracing::debug!(records = records.len(), "snapshot refreshed");
                Ok::<_, FetchError>(records)
            })
            .await;
        if let Err(e) = &result {
            self.errors.inc();
            tracing::error!(error = %e, domain = self.domain, "fetch failed");
        }
        result
    }

    pub fn scrape_duration(&self) -> Duration {
        self.scraper.duration()
    }

    pub fn scrape_error(&self) -> &IntCounter {
        &self.errors
    }
}
