// slurm_partition_*, slurm_cpus_*, slurm_mem_* and node scrape stats

use super::{Sample, duration_sample};
use crate::aggregation::{cpu_summary, mem_summary, non_zero, partition_metrics};
use crate::fetcher::Fetcher;
use crate::models::NodeRecord;
use crate::scraper::ByteScraper;

pub fn samples(nodes: &[NodeRecord]) -> Vec<Sample> {
    let mut out = Vec::new();
    for (partition, m) in partition_metrics(nodes) {
        let per_partition = [
            ("slurm_partition_total_cpus", "Total cpus per partition", m.total_cpus),
            ("slurm_partition_real_mem", "Real mem per partition", m.real_memory),
            ("slurm_partition_free_mem", "Free mem per partition", m.free_memory),
            ("slurm_partition_idle_cpus", "Idle cpus per partition", m.idle_cpus),
            ("slurm_partition_weight", "Total node weight per partition", m.weight),
            ("slurm_partition_cpu_load", "Total cpu load per partition", m.cpu_load),
        ];
        for (name, help, value) in per_partition.into_iter().filter(|(_, _, v)| *v > 0.0) {
            out.push(Sample::gauge(name, help, value).label("partition", partition.as_str()));
        }
        for (state, v) in non_zero(&m.alloc_memory) {
            out.push(
                Sample::gauge("slurm_partition_alloc_mem", "Alloc mem per partition", v)
                    .label("partition", partition.as_str())
                    .label("state", state.as_str()),
            );
        }
        for (state, v) in non_zero(&m.alloc_cpus) {
            out.push(
                Sample::gauge("slurm_partition_alloc_cpus", "Alloc cpus per partition", v)
                    .label("partition", partition.as_str())
                    .label("state", state.as_str()),
            );
        }
    }

    let cpus = cpu_summary(nodes);
    out.push(Sample::gauge("slurm_cpus_total", "Total cpus", cpus.total));
    out.push(Sample::gauge("slurm_cpus_idle", "Total idle cpus", cpus.idle));
    out.push(Sample::gauge("slurm_cpu_load", "Total cpu load", cpus.load));
    for (state, per_state) in &cpus.per_state {
        out.push(
            Sample::gauge(
                "slurm_cpus_per_state",
                "Cpus per state i.e alloc, mixed, draining, etc.",
                per_state.cpus,
            )
            .label("state", state.as_str()),
        );
        out.push(
            Sample::gauge("slurm_node_count_per_state", "nodes per state", per_state.count)
                .label("state", state.as_str()),
        );
    }

    let mem = mem_summary(nodes);
    out.push(Sample::gauge("slurm_mem_real", "Total real mem", mem.real));
    out.push(Sample::gauge("slurm_mem_free", "Total free mem", mem.free));
    out.push(Sample::gauge("slurm_mem_alloc", "Total alloc mem", mem.alloc));
    out
}

pub async fn collect<S: ByteScraper>(fetcher: &Fetcher<NodeRecord, S>) -> Vec<Sample> {
    let result = fetcher.fetch_metrics().await;
    let mut out = vec![duration_sample(
        "slurm_node_scrape_duration",
        "how long the sinfo cmd took (ms)",
        fetcher.scrape_duration(),
    )];
    if let Ok(nodes) = result {
        out.extend(samples(&nodes));
    }
    out
}
