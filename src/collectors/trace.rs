// Per-job process telemetry joined with the job snapshot

use std::collections::HashMap;

use super::Sample;
use crate::models::{JobRecord, TraceRecord};

pub fn samples(jobs: &[JobRecord], traces: &HashMap<u64, TraceRecord>) -> Vec<Sample> {
    let mut out = Vec::new();
    for job in jobs {
        let Some(t) = traces.get(&job.job_id) else {
            continue;
        };
        let jobid = job.job_id.to_string();
        out.push(
            Sample::gauge("slurm_job_mem_alloc", "running job mem allocated", job.total_alloc_mem())
                .label("jobid", jobid.as_str()),
        );
        out.push(
            Sample::gauge("slurm_job_cpu_alloc", "running job cpus allocated", job.alloc_cpus)
                .label("jobid", jobid.as_str()),
        );
        out.push(
            Sample::gauge("slurm_proc_pid", "pid of running slurm job", t.pid as f64)
                .label("jobid", jobid.as_str())
                .label("hostname", t.hostname.as_str()),
        );
        let usage = [
            ("slurm_proc_cpu_usage", "actual cpu usage collected from proc monitor", t.cpus),
            ("slurm_proc_mem_usage", "proc mem usage", t.mem),
            ("slurm_proc_threadcount", "threads currently being used", t.threads),
            ("slurm_proc_write_bytes", "proc write bytes", t.write_bytes),
            ("slurm_proc_read_bytes", "proc read bytes", t.read_bytes),
        ];
        for (name, help, v) in usage {
            out.push(
                Sample::gauge(name, help, v)
                    .label("jobid", jobid.as_str())
                    .label("username", t.username.as_str()),
            );
        }
    }
    out
}
