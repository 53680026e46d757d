// Controller daemon diagnostics

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserRpc {
    pub user: String,
    pub count: f64,
    pub avg_time: f64,
    pub total_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageRpc {
    pub message_type: String,
    pub count: f64,
    pub avg_time: f64,
    pub total_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiagnosticRecord {
    pub server_thread_count: f64,
    pub dbd_agent_queue_size: f64,
    pub backfill_job_count: f64,
    pub backfill_cycle_count_sum: f64,
    pub backfill_cycle_counter: f64,
    pub backfill_last_depth: f64,
    pub backfill_last_depth_try: f64,
    pub rpcs_by_user: Vec<UserRpc>,
    pub rpcs_by_message_type: Vec<MessageRpc>,
}
