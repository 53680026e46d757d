// Node rollups: per partition, cluster cpu and cluster memory

use std::collections::BTreeMap;

use crate::models::NodeRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionMetrics {
    pub total_cpus: f64,
    pub real_memory: f64,
    pub free_memory: f64,
    pub idle_cpus: f64,
    pub weight: f64,
    pub cpu_load: f64,
    /// Keyed by node state.
    pub alloc_memory: BTreeMap<String, f64>,
    pub alloc_cpus: BTreeMap<String, f64>,
}

/// A node counts toward every partition it belongs to.
pub fn partition_metrics(nodes: &[NodeRecord]) -> BTreeMap<String, PartitionMetrics> {
    let mut partitions: BTreeMap<String, PartitionMetrics> = BTreeMap::new();
    for node in nodes {
        for p in &node.partitions {
            let m = partitions.entry(p.clone()).or_default();
            *m.alloc_cpus.entry(node.state.clone()).or_default() += node.alloc_cpus;
            *m.alloc_memory.entry(node.state.clone()).or_default() += node.alloc_memory;
            m.total_cpus += node.cpus;
            m.cpu_load += node.cpu_load;
            m.free_memory += node.free_memory;
            m.idle_cpus += node.idle_cpus;
            m.real_memory += node.real_memory;
            m.weight += node.weight;
        }
    }
    partitions
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerStateCpus {
    pub cpus: f64,
    pub count: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuSummary {
    pub total: f64,
    pub idle: f64,
    pub load: f64,
    pub per_state: BTreeMap<String, PerStateCpus>,
}

pub fn cpu_summary(nodes: &[NodeRecord]) -> CpuSummary {
    let mut summary = CpuSummary::default();
    for node in nodes {
        summary.total += node.cpus;
        summary.idle += node.idle_cpus;
        summary.load += node.cpu_load;
        let state = summary.per_state.entry(node.state.clone()).or_default();
        state.cpus += node.cpus;
        state.count += 1.0;
    }
    summary
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemSummary {
    pub real: f64,
    pub free: f64,
    pub alloc: f64,
}

pub fn mem_summary(nodes: &[NodeRecord]) -> MemSummary {
    nodes.iter().fold(MemSummary::default(), |acc, n| MemSummary {
        real: acc.real + n.real_memory,
        free: acc.free + n.free_memory,
        alloc: acc.alloc + n.alloc_memory,
    })
}
