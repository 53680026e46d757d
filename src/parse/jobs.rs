// squeue output: `--json` (both job_resources layouts) and the compact fallback format

use std::collections::BTreeMap;
use std::sync::LazyLock;

use prometheus::IntCounter;
use regex::Regex;
use serde::Deserialize;

use super::{
    Envelope, StateField, TaggedNumber, decode_rows, deserialize_nullable_time, lines,
    mem_to_float,
};
use crate::error::{JobIdError, ParseError};
use crate::models::{JobRecord, NodeAllocation, PENDING};

const DOMAIN: &str = "jobs";

static PENDING_REASON_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\((?P<reason>(.+))\)$").ok());

#[derive(Debug, Deserialize)]
struct JobRow {
    job_id: TaggedNumber,
    #[serde(default)]
    account: String,
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    job_state: StateField,
    #[serde(default)]
    partition: String,
    #[serde(default)]
    features: String,
    #[serde(default)]
    state_reason: String,
    #[serde(default)]
    end_time: TaggedNumber,
    #[serde(default)]
    job_resources: JobResources,
}

#[derive(Debug, Default, Deserialize)]
struct JobResources {
    #[serde(default)]
    allocated_cpus: TaggedNumber,
    #[serde(default)]
    cpus: TaggedNumber,
    #[serde(default)]
    allocated_nodes: Option<AllocatedNodes>,
    #[serde(default)]
    nodes: Option<ResourceNodes>,
}

/// Older releases: `allocated_nodes` keyed by node index, or a plain list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AllocatedNodes {
    Map(BTreeMap<String, AllocatedNode>),
    List(Vec<AllocatedNode>),
}

#[derive(Debug, Deserialize)]
struct AllocatedNode {
    #[serde(default)]
    nodename: Option<String>,
    #[serde(default, alias = "memory_allocated")]
    memory: TaggedNumber,
}

/// Newer releases: `nodes` is an object with an `allocation` list; older ones
/// print the node list expression as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResourceNodes {
    Expression(String),
    Detail {
        #[serde(default)]
        allocation: Vec<NodeAllocationRow>,
    },
}

#[derive(Debug, Deserialize)]
struct NodeAllocationRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    memory: AllocationMemory,
    #[serde(default)]
    cpus: AllocationCpus,
}

#[derive(Debug, Default, Deserialize)]
struct AllocationMemory {
    #[serde(default)]
    allocated: TaggedNumber,
}

#[derive(Debug, Default, Deserialize)]
struct AllocationCpus {
    #[serde(default)]
    count: TaggedNumber,
}

impl JobResources {
    fn into_allocation(self) -> (f64, Vec<NodeAllocation>) {
        let mut cpus = self.allocated_cpus.or_zero();
        if cpus == 0.0 {
            cpus = self.cpus.or_zero();
        }
        let mut nodes = Vec::new();
        match self.allocated_nodes {
            Some(AllocatedNodes::Map(map)) => {
                for (key, n) in map {
                    nodes.push(NodeAllocation {
                        node: n.nodename.unwrap_or(key),
                        memory: n.memory.or_zero(),
                    });
                }
            }
            Some(AllocatedNodes::List(list)) => {
                for n in list {
                    nodes.push(NodeAllocation {
                        node: n.nodename.unwrap_or_default(),
                        memory: n.memory.or_zero(),
                    });
                }
            }
            None => {}
        }
        if let Some(ResourceNodes::Detail { allocation }) = self.nodes {
            let mut counted = 0.0;
            for a in allocation {
                counted += a.cpus.count.or_zero();
                nodes.push(NodeAllocation {
                    node: a.name,
                    memory: a.memory.allocated.or_zero(),
                });
            }
            if cpus == 0.0 {
                cpus = counted;
            }
        }
        (cpus, nodes)
    }
}

/// Job ids must be whole and positive; anything else could never match a trace.
fn job_id(raw: f64) -> Result<u64, JobIdError> {
    if raw.is_finite() && raw >= 1.0 && raw.fract() == 0.0 && raw <= u64::MAX as f64 {
        Ok(raw as u64)
    } else {
        Err(JobIdError::Invalid(raw))
    }
}

impl TryFrom<JobRow> for JobRecord {
    type Error = JobIdError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let job_id = job_id(row.job_id.value()?)?;
        let (alloc_cpus, alloc_nodes) = row.job_resources.into_allocation();
        Ok(JobRecord {
            job_id,
            account: row.account,
            user_name: row.user_name,
            job_state: row.job_state.joined(),
            partition: row.partition,
            features: row.features,
            state_reason: row.state_reason,
            end_time: row.end_time.or_zero(),
            alloc_cpus,
            alloc_nodes,
        })
    }
}

/// Parses `squeue --json`. Per-node memory stays in the units slurm reports.
pub fn parse_job_json(bytes: &[u8], errors: &IntCounter) -> Result<Vec<JobRecord>, ParseError> {
    let mut envelope = Envelope::decode(bytes)?;
    let rows: Vec<JobRow> = decode_rows(envelope.take("jobs")?, DOMAIN, errors)?;
    let mut jobs = Vec::with_capacity(rows.len());
    for row in rows {
        match JobRecord::try_from(row) {
            Ok(job) => jobs.push(job),
            Err(e) => {
                errors.inc();
                tracing::warn!(error = %e, domain = DOMAIN, "skipping job without usable id");
            }
        }
    }
    Ok(jobs)
}

#[derive(Debug, Deserialize)]
struct FallbackLine {
    #[serde(default)]
    a: String,
    id: f64,
    #[serde(deserialize_with = "deserialize_nullable_time")]
    end_time: f64,
    #[serde(default)]
    u: String,
    state: String,
    #[serde(default)]
    p: String,
    cpu: i64,
    mem: String,
    #[serde(default)]
    r: String,
}

/// Strips the parentheses squeue puts around a pending reason.
fn pending_reason(raw: &str) -> Option<&str> {
    let caps = PENDING_REASON_RE.as_ref()?.captures(raw)?;
    caps.name("reason").map(|m| m.as_str())
}

/// Parses the one-object-per-line fallback format. Memory strings carry a unit
/// suffix and are converted to bytes.
pub fn parse_job_fallback(bytes: &[u8], errors: &IntCounter) -> Result<Vec<JobRecord>, ParseError> {
    let mut jobs = Vec::new();
    for (i, line) in lines(bytes) {
        let parsed: FallbackLine = match serde_json::from_slice(line) {
            Ok(p) => p,
            Err(e) => {
                errors.inc();
                tracing::error!(
                    error = %e,
                    line = i,
                    raw = %String::from_utf8_lossy(line),
                    "squeue fallback parse error"
                );
                continue;
            }
        };
        let id = match job_id(parsed.id) {
            Ok(id) => id,
            Err(e) => {
                errors.inc();
                tracing::error!(error = %e, line = i, "squeue fallback parse error");
                continue;
            }
        };
        let mem = match mem_to_float(&parsed.mem) {
            Ok(m) => m,
            Err(e) => {
                errors.inc();
                tracing::error!(error = %e, line = i, "squeue fallback parse error");
                continue;
            }
        };
        let mut state_reason = parsed.r;
        if parsed.state == PENDING {
            match pending_reason(&state_reason) {
                Some(reason) => state_reason = reason.to_string(),
                None => {
                    errors.inc();
                    tracing::error!(reason = %state_reason, "squeue failed to pull pending state reason");
                }
            }
        }
        jobs.push(JobRecord {
            job_id: id,
            account: parsed.a,
            user_name: parsed.u,
            job_state: parsed.state,
            partition: parsed.p,
            features: String::new(),
            state_reason,
            end_time: parsed.end_time,
            alloc_cpus: parsed.cpu as f64,
            alloc_nodes: vec![NodeAllocation {
                node: String::new(),
                memory: mem,
            }],
        });
    }
    Ok(jobs)
}
