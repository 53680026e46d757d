// Rollups over parsed fixtures and hand-built records

mod common;

use common::{counter, fixture};
use slurm_exporter::aggregation::{
    account_metrics, cpu_summary, feature_metrics, mem_summary, partition_job_metrics,
    partition_metrics, pending_reason_metrics, user_metrics,
};
use slurm_exporter::collectors;
use slurm_exporter::models::{DiagnosticRecord, JobRecord, LicenseRecord, MessageRpc, NodeRecord, UserRpc};
use slurm_exporter::parse::{jobs, nodes};

fn sinfo() -> Vec<NodeRecord> {
    nodes::parse_node_json(&fixture("sinfo_out.json"), &counter()).expect("sinfo fixture")
}

fn squeue() -> Vec<JobRecord> {
    jobs::parse_job_json(&fixture("squeue_out.json"), &counter()).expect("squeue fixture")
}

#[test]
fn test_partition_metrics_count_shared_nodes_in_each_partition() {
    let parts = partition_metrics(&sinfo());
    let hw = &parts["hw"];
    // cs10 + cs11
    assert_eq!(hw.total_cpus, 128.0);
    assert_eq!(hw.idle_cpus, 48.0);
    assert_eq!(hw.alloc_cpus["mixed"], 16.0);
    assert_eq!(hw.alloc_cpus["allocated"], 64.0);
    assert_eq!(hw.alloc_memory["allocated"], 500000.0);

    let hwl = &parts["hw-l"];
    // cs10 + cs12
    assert_eq!(hwl.total_cpus, 96.0);
    assert_eq!(hwl.weight, 11.0);
    assert_eq!(hwl.alloc_cpus["idle"], 0.0);
}

#[test]
fn test_cpu_and_mem_summary() {
    let nodes = sinfo();
    let cpus = cpu_summary(&nodes);
    assert_eq!(cpus.total, 160.0);
    assert_eq!(cpus.idle, 80.0);
    assert_eq!(cpus.load, 76.0);
    assert_eq!(cpus.per_state["allocated"].count, 1.0);
    assert_eq!(cpus.per_state["idle"].cpus, 32.0);

    let mem = mem_summary(&nodes);
    assert_eq!(mem.real, 1280000.0);
    assert_eq!(mem.free, 518000.0);
    assert_eq!(mem.alloc, 628000.0);
}

#[test]
fn test_account_and_user_rollups() {
    let jobs = squeue();
    let accounts = account_metrics(&jobs);
    let hw = &accounts["hw"];
    assert_eq!(hw.alloc_cpu["RUNNING"], 48.0);
    assert_eq!(hw.alloc_mem["RUNNING"], 96000.0);
    assert_eq!(hw.job_count["RUNNING"], 2.0);
    assert_eq!(accounts["sw"].job_count["PENDING"], 2.0);

    let users = user_metrics(&jobs);
    assert_eq!(users["alice"].job_count["RUNNING"], 1.0);
    assert_eq!(users["alice"].job_count["PENDING"], 1.0);
    assert_eq!(users["carol"].job_count["PENDING"], 1.0);
}

#[test]
fn test_multi_partition_job_counts_in_each() {
    let parts = partition_job_metrics(&squeue());
    assert_eq!(parts["hw-l"]["RUNNING"], 1.0);
    assert_eq!(parts["hw-l"]["PENDING"], 1.0);
    assert_eq!(parts["hw"]["RUNNING"], 1.0);
    assert_eq!(parts["hw"]["PENDING"], 2.0);
}

#[test]
fn test_feature_rollup() {
    let features = feature_metrics(&squeue());
    assert_eq!(features["gpu"].total, 2.0);
    assert_eq!(features["gpu"].alloc_cpu, 16.0);
    assert_eq!(features["gpu"].alloc_mem, 64000.0);
    assert_eq!(features["nvme"].total, 1.0);
    assert!(!features.contains_key(""));
}

#[test]
fn test_pending_reasons_collapse_node_lists() {
    let reasons = pending_reason_metrics(&squeue());
    assert_eq!(reasons.len(), 2);
    assert_eq!(reasons["Resources"], 1.0);
    assert_eq!(reasons["(ReqNodeNotAvail, UnavailableNodes)"], 1.0);
}

#[test]
fn test_empty_snapshot_has_no_buckets() {
    assert!(partition_metrics(&[]).is_empty());
    assert!(account_metrics(&[]).is_empty());
    assert_eq!(cpu_summary(&[]).total, 0.0);
    assert!(collectors::jobs::samples(&[]).is_empty());
}

#[test]
fn test_job_samples_skip_zero_values() {
    let samples = collectors::jobs::samples(&squeue());
    // PENDING jobs hold no cpus, so no cpu sample for sw/PENDING
    assert!(!samples.iter().any(|s| s.name == "slurm_account_job_state_cpu_alloc"
        && s.label_value("account") == Some("sw")));
    assert!(samples.iter().any(|s| s.name == "slurm_account_job_state_total"
        && s.label_value("account") == Some("sw")
        && s.label_value("state") == Some("PENDING")
        && s.value == 2.0));
    assert!(samples.iter().all(|s| s.value > 0.0));
}

#[test]
fn test_node_samples_use_partition_label() {
    let samples = collectors::nodes::samples(&sinfo());
    let total = samples
        .iter()
        .find(|s| s.name == "slurm_partition_total_cpus" && s.label_value("partition") == Some("hw"))
        .unwrap();
    assert_eq!(total.value, 128.0);
    let cluster = samples.iter().find(|s| s.name == "slurm_cpus_total").unwrap();
    assert_eq!(cluster.value, 160.0);
}

#[test]
fn test_idle_partition_emits_no_zero_gauges() {
    let drained = NodeRecord {
        hostname: "cs99".into(),
        partitions: vec!["empty".into()],
        state: "down".into(),
        ..Default::default()
    };
    let samples = collectors::nodes::samples(&[drained]);
    assert!(!samples.iter().any(|s| s.label_value("partition") == Some("empty")));
    // cluster totals are always reported
    assert!(samples.iter().any(|s| s.name == "slurm_cpus_total" && s.value == 0.0));
}

#[test]
fn test_license_samples_skip_zero_values() {
    let licenses = [
        LicenseRecord {
            name: "matlab".into(),
            ..Default::default()
        },
        LicenseRecord {
            name: "vcs".into(),
            total: 10.0,
            free: 10.0,
            ..Default::default()
        },
    ];
    let samples = collectors::licenses::samples(&licenses);
    assert!(!samples.iter().any(|s| s.label_value("name") == Some("matlab")));
    assert_eq!(samples.len(), 2);
    assert!(samples.iter().all(|s| s.value > 0.0));
}

#[test]
fn test_diag_rpc_samples_skip_zero_values() {
    let diag = DiagnosticRecord {
        rpcs_by_user: vec![UserRpc {
            user: "root".into(),
            ..Default::default()
        }],
        rpcs_by_message_type: vec![MessageRpc {
            message_type: "REQUEST_PING".into(),
            count: 3.0,
            ..Default::default()
        }],
        ..Default::default()
    };
    let samples = collectors::diags::samples(&diag);
    assert!(!samples.iter().any(|s| s.name.starts_with("slurm_rpc_user")));
    let rpc: Vec<_> = samples.iter().filter(|s| s.name.starts_with("slurm_rpc_msg_type")).collect();
    assert_eq!(rpc.len(), 1);
    assert_eq!(rpc[0].name, "slurm_rpc_msg_type_count");
}
