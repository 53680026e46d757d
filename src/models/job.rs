// Job listing record

use serde::Serialize;

pub const PENDING: &str = "PENDING";

/// Memory allocated to a job on one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeAllocation {
    pub node: String,
    pub memory: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobRecord {
    pub job_id: u64,
    pub account: String,
    pub user_name: String,
    pub job_state: String,
    /// May hold a comma separated list when the job was submitted to several partitions.
    pub partition: String,
    /// `&` delimited feature constraint, e.g. "gpu&nvme".
    pub features: String,
    pub state_reason: String,
    /// Unix seconds; 0 when upstream reports N/A or NONE.
    pub end_time: f64,
    pub alloc_cpus: f64,
    pub alloc_nodes: Vec<NodeAllocation>,
}

impl JobRecord {
    /// Sum of the memory allocated on every node the job runs on.
    pub fn total_alloc_mem(&self) -> f64 {
        self.alloc_nodes.iter().map(|n| n.memory).sum()
    }

    pub fn partitions(&self) -> impl Iterator<Item = &str> {
        self.partition
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn feature_tags(&self) -> impl Iterator<Item = &str> {
        self.features
            .split('&')
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    pub fn is_pending(&self) -> bool {
        self.job_state == PENDING
    }
}
