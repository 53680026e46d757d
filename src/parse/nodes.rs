// sinfo output: `--json`, `-N --json` (data parser) and the compact fallback format

use std::collections::BTreeMap;

use prometheus::IntCounter;
use serde::Deserialize;

use super::{
    Envelope, StateField, TaggedNumber, decode_rows, deserialize_nullable_float, lines,
};
use crate::error::ParseError;
use crate::models::NodeRecord;

const DOMAIN: &str = "nodes";
const ONE_NODE_PER_ENTRY: &str =
    "must contain only 1 node per entry, please use the -N option exp. `sinfo -N --json`";

#[derive(Debug, Deserialize)]
struct NodeRow {
    hostname: String,
    #[serde(default)]
    partitions: Vec<String>,
    #[serde(default)]
    state: StateField,
    #[serde(default)]
    cpus: TaggedNumber,
    #[serde(default)]
    alloc_cpus: TaggedNumber,
    #[serde(default, alias = "alloc_idle_cpus")]
    idle_cpus: TaggedNumber,
    #[serde(default)]
    cpu_load: TaggedNumber,
    #[serde(default)]
    real_memory: TaggedNumber,
    #[serde(default, alias = "free_mem")]
    free_memory: TaggedNumber,
    #[serde(default)]
    alloc_memory: TaggedNumber,
    #[serde(default)]
    weight: TaggedNumber,
}

impl From<NodeRow> for NodeRecord {
    fn from(row: NodeRow) -> Self {
        NodeRecord {
            hostname: row.hostname,
            partitions: row.partitions,
            state: row.state.joined(),
            cpus: row.cpus.or_zero(),
            alloc_cpus: row.alloc_cpus.or_zero(),
            idle_cpus: row.idle_cpus.or_zero(),
            cpu_load: row.cpu_load.or_zero(),
            real_memory: row.real_memory.or_zero(),
            free_memory: row.free_memory.or_zero(),
            alloc_memory: row.alloc_memory.or_zero(),
            weight: row.weight.or_zero(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SinfoEntry {
    #[serde(default)]
    node: SinfoNode,
    nodes: SinfoNodes,
    #[serde(default)]
    cpus: SinfoCpus,
    #[serde(default)]
    memory: SinfoMemory,
    #[serde(default)]
    partition: SinfoPartition,
    #[serde(default)]
    weight: SinfoRange,
}

#[derive(Debug, Default, Deserialize)]
struct SinfoNode {
    #[serde(default)]
    state: StateField,
}

#[derive(Debug, Default, Deserialize)]
struct SinfoNodes {
    #[serde(default)]
    total: TaggedNumber,
    #[serde(default)]
    nodes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SinfoCpus {
    #[serde(default)]
    allocated: TaggedNumber,
    #[serde(default)]
    idle: TaggedNumber,
    #[serde(default)]
    total: TaggedNumber,
    #[serde(default)]
    load: SinfoRange,
}

#[derive(Debug, Default, Deserialize)]
struct SinfoRange {
    #[serde(default)]
    minimum: TaggedNumber,
    #[serde(default)]
    maximum: TaggedNumber,
}

#[derive(Debug, Default, Deserialize)]
struct SinfoMemory {
    #[serde(default)]
    minimum: TaggedNumber,
    #[serde(default)]
    maximum: TaggedNumber,
    #[serde(default)]
    allocated: TaggedNumber,
    #[serde(default)]
    free: SinfoRange,
}

#[derive(Debug, Default, Deserialize)]
struct SinfoPartition {
    #[serde(default)]
    name: String,
    #[serde(default)]
    alternate: String,
}

impl TryFrom<SinfoEntry> for NodeRecord {
    type Error = ParseError;

    fn try_from(entry: SinfoEntry) -> Result<Self, Self::Error> {
        let single = |range: &SinfoRange| range.minimum.or_zero() == range.maximum.or_zero();
        if entry.nodes.total.or_zero() != 1.0
            || entry.memory.minimum.or_zero() != entry.memory.maximum.or_zero()
            || !single(&entry.memory.free)
        {
            return Err(ParseError::Schema(ONE_NODE_PER_ENTRY.into()));
        }
        let hostname = entry
            .nodes
            .nodes
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::Schema(ONE_NODE_PER_ENTRY.into()))?;
        let mut partitions = Vec::new();
        for p in [entry.partition.name, entry.partition.alternate] {
            if !p.is_empty() && !partitions.contains(&p) {
                partitions.push(p);
            }
        }
        Ok(NodeRecord {
            hostname,
            partitions,
            state: entry.node.state.joined(),
            cpus: entry.cpus.total.or_zero(),
            alloc_cpus: entry.cpus.allocated.or_zero(),
            idle_cpus: entry.cpus.idle.or_zero(),
            cpu_load: entry.cpus.load.maximum.or_zero(),
            real_memory: entry.memory.maximum.or_zero(),
            free_memory: entry.memory.free.maximum.or_zero(),
            alloc_memory: entry.memory.allocated.or_zero(),
            weight: entry.weight.maximum.or_zero(),
        })
    }
}

/// Parses `sinfo --json` (flat or tagged numbers) and `sinfo -N --json` (`sinfo` section).
pub fn parse_node_json(bytes: &[u8], errors: &IntCounter) -> Result<Vec<NodeRecord>, ParseError> {
    let mut envelope = Envelope::decode(bytes)?;
    if envelope.has_section("sinfo") {
        let entries: Vec<SinfoEntry> = decode_rows(envelope.take("sinfo")?, DOMAIN, errors)?;
        let nodes = entries
            .into_iter()
            .map(NodeRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(merge_nodes(nodes));
    }
    let rows: Vec<NodeRow> = decode_rows(envelope.take("nodes")?, DOMAIN, errors)?;
    Ok(merge_nodes(rows.into_iter().map(NodeRecord::from)))
}

#[derive(Debug, Deserialize)]
struct FallbackLine {
    n: String,
    mem: f64,
    #[serde(deserialize_with = "deserialize_nullable_float")]
    fmem: f64,
    cstate: String,
    p: String,
    #[serde(deserialize_with = "deserialize_nullable_float")]
    l: f64,
    s: String,
    #[serde(default)]
    w: f64,
}

/// Splits `%C` ("alloc/idle/other/total") into (alloc, idle, total).
fn cpu_states(cstate: &str) -> Option<(f64, f64, f64)> {
    let parts = cstate
        .split('/')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [alloc, idle, _other, total] => Some((*alloc, *idle, *total)),
        _ => None,
    }
}

/// Parses the one-object-per-line fallback format. sinfo prints one line per
/// (node, partition) pair; memory arrives in MB and is converted to bytes.
pub fn parse_node_fallback(bytes: &[u8], errors: &IntCounter) -> Result<Vec<NodeRecord>, ParseError> {
    let mut nodes = Vec::new();
    for (i, line) in lines(bytes) {
        let parsed: FallbackLine = match serde_json::from_slice(line) {
            Ok(p) => p,
            Err(e) => {
                errors.inc();
                tracing::error!(
                    error = %e,
                    line = i,
                    raw = %String::from_utf8_lossy(line),
                    "sinfo failed to parse line"
                );
                continue;
            }
        };
        let Some((alloc_cpus, idle_cpus, cpus)) = cpu_states(&parsed.cstate) else {
            errors.inc();
            tracing::error!(line = i, cstate = %parsed.cstate, "unexpected cpu state format");
            continue;
        };
        let real_memory = parsed.mem * 1e6;
        let free_memory = parsed.fmem * 1e6;
        nodes.push(NodeRecord {
            hostname: parsed.n,
            partitions: vec![parsed.p],
            state: parsed.s,
            cpus,
            alloc_cpus,
            idle_cpus,
            cpu_load: parsed.l,
            real_memory,
            free_memory,
            alloc_memory: real_memory - free_memory,
            weight: parsed.w,
        });
    }
    Ok(merge_nodes(nodes))
}

/// Collapses rows sharing a hostname into one record, ordered by hostname.
pub fn merge_nodes(nodes: impl IntoIterator<Item = NodeRecord>) -> Vec<NodeRecord> {
    let mut merged: BTreeMap<String, NodeRecord> = BTreeMap::new();
    for node in nodes {
        match merged.get_mut(&node.hostname) {
            Some(existing) => existing.merge(node),
            None => {
                merged.insert(node.hostname.clone(), node);
            }
        }
    }
    merged.into_values().collect()
}
