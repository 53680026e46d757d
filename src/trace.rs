// In-memory store of pushed process traces, keyed by job id

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::instrument;

use crate::error::TraceError;
use crate::models::TraceRecord;

/// Size above which an insert evicts eagerly.
pub const CLEANUP_THRESHOLD: usize = 1_000;
pub const DEFAULT_SAMPLE_RATE: Duration = Duration::from_secs(10);

/// Latest trace per job. Entries older than the sample rate are dropped on
/// every access, so the store never grows past the threshold for longer than
/// one `add`.
#[derive(Debug)]
pub struct TraceStore {
    traces: Mutex<HashMap<u64, TraceRecord>>,
    sample_rate: Duration,
    cleanup_threshold: usize,
}

impl Default for TraceStore {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl TraceStore {
    pub fn new(sample_rate: Duration) -> Self {
        Self::with_threshold(sample_rate, CLEANUP_THRESHOLD)
    }

    pub fn with_threshold(sample_rate: Duration, cleanup_threshold: usize) -> Self {
        Self {
            traces: Mutex::new(HashMap::new()),
            sample_rate,
            cleanup_threshold,
        }
    }

    pub fn sample_rate(&self) -> Duration {
        self.sample_rate
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, TraceRecord>> {
        self.traces.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expire(&self, traces: &mut HashMap<u64, TraceRecord>) {
        let rate = self.sample_rate;
        traces.retain(|_, t| t.uploaded_at.is_some_and(|at| at.elapsed() <= rate));
    }

    /// Stores `trace`, replacing any earlier one for the same job.
    #[instrument(skip(self, trace), fields(job_id = trace.job_id))]
    pub fn add(&self, mut trace: TraceRecord) -> Result<(), TraceError> {
        if trace.job_id == 0 {
            return Err(TraceError::JobIdUnset);
        }
        let job_id = trace.job_id;
        trace.uploaded_at = Some(Instant::now());
        let mut traces = self.lock();
        traces.insert(job_id, trace);
        self.expire(&mut traces);
        if traces.len() > self.cleanup_threshold {
            let evicted = self.evict_oldest(&mut traces, job_id);
            tracing::warn!(evicted, size = traces.len(), "trace store over threshold");
        }
        Ok(())
    }

    /// Drops the oldest entries, never `keep`, until the threshold holds.
    fn evict_oldest(&self, traces: &mut HashMap<u64, TraceRecord>, keep: u64) -> usize {
        let excess = traces.len().saturating_sub(self.cleanup_threshold);
        let mut by_age: Vec<(Option<Instant>, u64)> = traces
            .iter()
            .filter(|(id, _)| **id != keep)
            .map(|(id, t)| (t.uploaded_at, *id))
            .collect();
        by_age.sort_unstable();
        for (_, id) in by_age.iter().take(excess) {
            traces.remove(id);
        }
        excess.min(by_age.len())
    }

    /// Snapshot of the live traces.
    pub fn fetch(&self) -> HashMap<u64, TraceRecord> {
        let mut traces = self.lock();
        self.expire(&mut traces);
        traces.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
