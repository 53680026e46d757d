// Domain records, one per polled entity kind

mod account;
mod diag;
mod job;
mod license;
mod node;
mod trace;

pub use account::AccountLimitRecord;
pub use diag::{DiagnosticRecord, MessageRpc, UserRpc};
pub use job::{JobRecord, NodeAllocation, PENDING};
pub use license::LicenseRecord;
pub use node::{NodeRecord, STATE_SEPARATOR};
pub use trace::TraceRecord;
