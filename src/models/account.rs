// Account association limits

use serde::Serialize;

/// Group limits for one account. A zero field means "no limit configured".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountLimitRecord {
    pub account: String,
    /// Bytes of memory the account may hold in the RUNNING state.
    pub alloc_mem: f64,
    pub alloc_cpu: f64,
    /// Jobs the account may have RUNNING.
    pub alloc_jobs: f64,
    /// Jobs the account may have PENDING or RUNNING.
    pub total_jobs: f64,
}
