// Process telemetry pushed by job-side tracers

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// One traced process, keyed by the job it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    #[serde(default)]
    pub job_id: u64,
    #[serde(default)]
    pub pid: i64,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub cpus: f64,
    #[serde(default)]
    pub mem: f64,
    #[serde(default)]
    pub threads: f64,
    #[serde(default)]
    pub read_bytes: f64,
    #[serde(default)]
    pub write_bytes: f64,
    /// Set by the store on insert; never taken from the wire.
    #[serde(skip)]
    pub uploaded_at: Option<Instant>,
}
