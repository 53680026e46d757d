// slurm_user_*, slurm_account_job_state_*, slurm_feature_*, pending reasons

use super::{Sample, duration_sample, trace};
use crate::aggregation::{
    account_metrics, feature_metrics, non_zero, partition_job_metrics, pending_reason_metrics,
    user_metrics,
};
use crate::fetcher::Fetcher;
use crate::models::JobRecord;
use crate::scraper::ByteScraper;
use crate::trace::TraceStore;

pub fn samples(jobs: &[JobRecord]) -> Vec<Sample> {
    let mut out = Vec::new();

    for (user, bucket) in user_metrics(jobs) {
        let series = [
            ("slurm_user_cpu_alloc", "total cpu alloc per user", &bucket.alloc_cpu),
            ("slurm_user_mem_alloc", "total mem alloc per user", &bucket.alloc_mem),
            ("slurm_user_state_total", "total jobs per state per user", &bucket.job_count),
        ];
        for (name, help, by_state) in series {
            for (state, v) in non_zero(by_state) {
                out.push(
                    Sample::gauge(name, help, v)
                        .label("username", user.as_str())
                        .label("state", state.as_str()),
                );
            }
        }
    }

    for (account, bucket) in account_metrics(jobs) {
        let series = [
            (
                "slurm_account_job_state_cpu_alloc",
                "alloc cpu consumed per account per job state",
                &bucket.alloc_cpu,
            ),
            (
                "slurm_account_job_state_mem_alloc",
                "alloc mem consumed per account per job state",
                &bucket.alloc_mem,
            ),
            (
                "slurm_account_job_state_total",
                "total jobs per account per job state",
                &bucket.job_count,
            ),
        ];
        for (name, help, by_state) in series {
            for (state, v) in non_zero(by_state) {
                out.push(
                    Sample::gauge(name, help, v)
                        .label("account", account.as_str())
                        .label("state", state.as_str()),
                );
            }
        }
    }

    for (partition, by_state) in partition_job_metrics(jobs) {
        for (state, v) in non_zero(&by_state) {
            out.push(
                Sample::gauge("slurm_partition_job_state_total", "total jobs per partition per state", v)
                    .label("partition", partition.as_str())
                    .label("state", state.as_str()),
            );
        }
    }

    for (feature, f) in feature_metrics(jobs) {
        let series = [
            ("slurm_feature_cpu_alloc", "alloc cpu consumed per feature", f.alloc_cpu),
            ("slurm_feature_mem_alloc", "alloc mem consumed per feature", f.alloc_mem),
            ("slurm_feature_total", "total jobs per feature", f.total),
        ];
        for (name, help, v) in series.into_iter().filter(|(_, _, v)| *v > 0.0) {
            out.push(Sample::gauge(name, help, v).label("feature", feature.as_str()));
        }
    }

    for (reason, v) in non_zero(&pending_reason_metrics(jobs)) {
        out.push(
            Sample::gauge("slurm_pending_reason_total", "count of the reason jobs are pending", v)
                .label("reason", reason.as_str()),
        );
    }
    out
}

/// Job rollups plus, when a trace store is given, per-job process telemetry
/// for jobs with a live trace. The snapshot is fetched once for both.
pub async fn collect<S: ByteScraper>(
    fetcher: &Fetcher<JobRecord, S>,
    traces: Option<&TraceStore>,
) -> Vec<Sample> {
    let result = fetcher.fetch_metrics().await;
    let mut out = vec![duration_sample(
        "slurm_job_scrape_duration",
        "how long the squeue cmd took (ms)",
        fetcher.scrape_duration(),
    )];
    if let Ok(jobs) = result {
        out.extend(samples(&jobs));
        if let Some(store) = traces {
            out.extend(trace::samples(&jobs, &store.fetch()));
        }
    }
    out
}
