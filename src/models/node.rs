// Node inventory record

use serde::Serialize;

/// Separator used when a node reports more than one state (e.g. "MIXED&DRAIN").
pub const STATE_SEPARATOR: &str = "&";

/// One compute node at scrape time. Memory values are bytes for the fallback
/// format and upstream units for JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeRecord {
    pub hostname: String,
    pub partitions: Vec<String>,
    pub state: String,
    pub cpus: f64,
    pub alloc_cpus: f64,
    pub idle_cpus: f64,
    pub cpu_load: f64,
    pub real_memory: f64,
    pub free_memory: f64,
    pub alloc_memory: f64,
    pub weight: f64,
}

impl NodeRecord {
    /// Folds another (node, partition) row for the same host into this record.
    /// Partitions and states are merged as sets; scalar fields keep the first value.
    pub fn merge(&mut self, other: NodeRecord) {
        for partition in other.partitions {
            if !self.partitions.contains(&partition) {
                self.partitions.push(partition);
            }
        }
        for state in other.state.split(STATE_SEPARATOR).filter(|s| !s.is_empty()) {
            if self.state.is_empty() {
                self.state = state.to_string();
            } else if !self.state.split(STATE_SEPARATOR).any(|s| s == state) {
                self.state.push_str(STATE_SEPARATOR);
                self.state.push_str(state);
            }
        }
    }
}
