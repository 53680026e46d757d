// Data sources: anything that can hand back one raw snapshot

mod cli;

pub use cli::{CLI_TIMEOUT_ENV, CliScraper, DEFAULT_TIMEOUT, parse_timeout};

use std::future::Future;
use std::time::Duration;

use crate::error::ScrapeError;

/// A source of raw snapshot bytes. Implementations know nothing about the
/// format of what they return.
pub trait ByteScraper: Send + Sync {
    fn fetch_raw_bytes(&self) -> impl Future<Output = Result<Vec<u8>, ScrapeError>> + Send;

    /// Wall time of the most recent call to `fetch_raw_bytes`.
    fn duration(&self) -> Duration;
}
