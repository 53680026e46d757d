// Pure rollups from record snapshots to grouped totals. Rebuilt on every pull.

pub mod jobs;
pub mod nodes;

pub use jobs::{
    FeatureBucket, StateBucket, account_metrics, feature_metrics, partition_job_metrics,
    pending_reason_metrics, user_metrics,
};
pub use nodes::{
    CpuSummary, MemSummary, PartitionMetrics, PerStateCpus, cpu_summary, mem_summary,
    partition_metrics,
};

/// Iterates `(key, value)` pairs whose value is worth emitting.
pub fn non_zero<'a, K: 'a>(
    map: impl IntoIterator<Item = (&'a K, &'a f64)>,
) -> impl Iterator<Item = (&'a K, f64)> {
    map.into_iter().filter(|(_, v)| **v > 0.0).map(|(k, v)| (k, *v))
}
