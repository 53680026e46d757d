// sdiag --json

use prometheus::IntCounter;
use serde::Deserialize;

use super::{DATA_PARSER, Envelope, TaggedNumber};
use crate::error::ParseError;
use crate::models::{DiagnosticRecord, MessageRpc, UserRpc};

#[derive(Debug, Default, Deserialize)]
struct Statistics {
    #[serde(default)]
    server_thread_count: TaggedNumber,
    #[serde(default)]
    dbd_agent_queue_size: TaggedNumber,
    #[serde(default)]
    rpcs_by_user: Vec<UserRpcRow>,
    #[serde(default)]
    rpcs_by_message_type: Vec<MessageRpcRow>,
    #[serde(default)]
    bf_backfilled_jobs: TaggedNumber,
    #[serde(default)]
    bf_cycle_sum: TaggedNumber,
    #[serde(default)]
    bf_cycle_counter: TaggedNumber,
    #[serde(default)]
    bf_last_depth: TaggedNumber,
    #[serde(default)]
    bf_last_depth_try: TaggedNumber,
}

#[derive(Debug, Deserialize)]
struct UserRpcRow {
    #[serde(default)]
    user: String,
    #[serde(default)]
    count: TaggedNumber,
    #[serde(default)]
    average_time: TaggedNumber,
    #[serde(default)]
    total_time: TaggedNumber,
}

#[derive(Debug, Deserialize)]
struct MessageRpcRow {
    #[serde(default)]
    message_type: String,
    #[serde(default)]
    count: TaggedNumber,
    #[serde(default)]
    average_time: TaggedNumber,
    #[serde(default)]
    total_time: TaggedNumber,
}

/// Returns a single record. Output is only trusted when the response was
/// rendered by the data_parser plugin.
pub fn parse_diag_json(bytes: &[u8], _errors: &IntCounter) -> Result<Vec<DiagnosticRecord>, ParseError> {
    let mut envelope = Envelope::decode(bytes)?;
    if !envelope.capability(DATA_PARSER) {
        return Err(ParseError::UnsupportedPlugin(DATA_PARSER));
    }
    let stats: Statistics = serde_json::from_value(envelope.take("statistics")?)?;
    Ok(vec![DiagnosticRecord {
        server_thread_count: stats.server_thread_count.or_zero(),
        dbd_agent_queue_size: stats.dbd_agent_queue_size.or_zero(),
        backfill_job_count: stats.bf_backfilled_jobs.or_zero(),
        backfill_cycle_count_sum: stats.bf_cycle_sum.or_zero(),
        backfill_cycle_counter: stats.bf_cycle_counter.or_zero(),
        backfill_last_depth: stats.bf_last_depth.or_zero(),
        backfill_last_depth_try: stats.bf_last_depth_try.or_zero(),
        rpcs_by_user: stats
            .rpcs_by_user
            .into_iter()
            .map(|r| UserRpc {
                user: r.user,
                count: r.count.or_zero(),
                avg_time: r.average_time.or_zero(),
                total_time: r.total_time.or_zero(),
            })
            .collect(),
        rpcs_by_message_type: stats
            .rpcs_by_message_type
            .into_iter()
            .map(|r| MessageRpc {
                message_type: r.message_type,
                count: r.count.or_zero(),
                avg_time: r.average_time.or_zero(),
                total_time: r.total_time.or_zero(),
            })
            .collect(),
    }])
}
