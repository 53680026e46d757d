// slurmctld daemon, backfill and rpc statistics

use super::{Sample, duration_sample};
use crate::fetcher::Fetcher;
use crate::models::DiagnosticRecord;
use crate::scraper::ByteScraper;

pub fn samples(diag: &DiagnosticRecord) -> Vec<Sample> {
    let mut out = vec![
        Sample::gauge("slurm_daemon_thread_count", "slurm daemon thread count", diag.server_thread_count),
        Sample::gauge(
            "slurm_dbd_agent_queue_size",
            "slurmdbd queue size, grows rapidly if the database is down or under stress",
            diag.dbd_agent_queue_size,
        ),
        Sample::gauge(
            "slurm_backfill_job_count",
            "jobs started thanks to backfilling since last slurm start",
            diag.backfill_job_count,
        ),
        Sample::gauge(
            "slurm_backfill_cycle_count",
            "backfill scheduling cycles since last reset",
            diag.backfill_cycle_count_sum,
        ),
        Sample::gauge(
            "slurm_backfill_last_depth",
            "jobs processed during the last backfill cycle",
            diag.backfill_last_depth,
        ),
        Sample::gauge(
            "slurm_backfill_last_depth_try_sched",
            "jobs with a chance to start processed during the last backfill cycle",
            diag.backfill_last_depth_try,
        ),
        Sample::gauge(
            "slurm_backfill_cycle_counter",
            "backfill scheduling cycles since last reset",
            diag.backfill_cycle_counter,
        ),
    ];
    for rpc in &diag.rpcs_by_user {
        let series = [
            ("slurm_rpc_user_count", "slurm rpc count per user", rpc.count),
            ("slurm_rpc_user_total_time", "slurm rpc total time per user", rpc.total_time),
        ];
        for (name, help, v) in series.into_iter().filter(|(_, _, v)| *v > 0.0) {
            out.push(Sample::gauge(name, help, v).label("user", rpc.user.as_str()));
        }
    }
    for rpc in &diag.rpcs_by_message_type {
        let series = [
            ("slurm_rpc_msg_type_count", "slurm rpc count per message type", rpc.count),
            ("slurm_rpc_msg_type_avg_time", "slurm rpc avg time per message type", rpc.avg_time),
            ("slurm_rpc_msg_type_total_time", "slurm rpc total time per message type", rpc.total_time),
        ];
        for (name, help, v) in series.into_iter().filter(|(_, _, v)| *v > 0.0) {
            out.push(Sample::gauge(name, help, v).label("type", rpc.message_type.as_str()));
        }
    }
    out
}

pub async fn collect<S: ByteScraper>(fetcher: &Fetcher<DiagnosticRecord, S>) -> Vec<Sample> {
    let result = fetcher.fetch_metrics().await;
    let mut out = vec![duration_sample(
        "slurm_diag_scrape_duration",
        "how long the sdiag cmd took (ms)",
        fetcher.scrape_duration(),
    )];
    if let Ok(diags) = result {
        for d in diags.iter() {
            out.extend(samples(d));
        }
    }
    out
}
