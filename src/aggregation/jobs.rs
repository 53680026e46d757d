// Job rollups by user, account, partition, feature and pending reason

use std::collections::BTreeMap;

use crate::models::JobRecord;

/// squeue appends the affected node list to this reason; it is collapsed so
/// the label stays node agnostic.
pub const REQ_NODE_NOT_AVAIL: &str = "ReqNodeNotAvail, UnavailableNodes";

/// Totals for one grouping key, split by job state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateBucket {
    pub alloc_cpu: BTreeMap<String, f64>,
    pub alloc_mem: BTreeMap<String, f64>,
    pub job_count: BTreeMap<String, f64>,
}

impl StateBucket {
    fn add(&mut self, job: &JobRecord) {
        *self.alloc_cpu.entry(job.job_state.clone()).or_default() += job.alloc_cpus;
        *self.alloc_mem.entry(job.job_state.clone()).or_default() += job.total_alloc_mem();
        *self.job_count.entry(job.job_state.clone()).or_default() += 1.0;
    }
}

fn bucket_by<'a>(
    jobs: &'a [JobRecord],
    key: impl Fn(&'a JobRecord) -> &'a str,
) -> BTreeMap<String, StateBucket> {
    let mut buckets: BTreeMap<String, StateBucket> = BTreeMap::new();
    for job in jobs {
        buckets.entry(key(job).to_string()).or_default().add(job);
    }
    buckets
}

pub fn user_metrics(jobs: &[JobRecord]) -> BTreeMap<String, StateBucket> {
    bucket_by(jobs, |j| j.user_name.as_str())
}

pub fn account_metrics(jobs: &[JobRecord]) -> BTreeMap<String, StateBucket> {
    bucket_by(jobs, |j| j.account.as_str())
}

/// Job counts per (partition, state). A job submitted to several partitions
/// counts once in each.
pub fn partition_job_metrics(jobs: &[JobRecord]) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut partitions: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for job in jobs {
        for p in job.partitions() {
            *partitions
                .entry(p.to_string())
                .or_default()
                .entry(job.job_state.clone())
                .or_default() += 1.0;
        }
    }
    partitions
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureBucket {
    pub alloc_mem: f64,
    pub alloc_cpu: f64,
    pub total: f64,
}

pub fn feature_metrics(jobs: &[JobRecord]) -> BTreeMap<String, FeatureBucket> {
    let mut features: BTreeMap<String, FeatureBucket> = BTreeMap::new();
    for job in jobs {
        for tag in job.feature_tags() {
            let f = features.entry(tag.to_string()).or_default();
            f.alloc_cpu += job.alloc_cpus;
            f.alloc_mem += job.total_alloc_mem();
            f.total += 1.0;
        }
    }
    features
}

/// Counts of PENDING jobs per reason.
pub fn pending_reason_metrics(jobs: &[JobRecord]) -> BTreeMap<String, f64> {
    let mut reasons: BTreeMap<String, f64> = BTreeMap::new();
    for job in jobs.iter().filter(|j| j.is_pending()) {
        let reason = if job.state_reason.contains(REQ_NODE_NOT_AVAIL) {
            format!("({REQ_NODE_NOT_AVAIL})")
        } else {
            job.state_reason.clone()
        };
        *reasons.entry(reason).or_default() += 1.0;
    }
    reasons
}
