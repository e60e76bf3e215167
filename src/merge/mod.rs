//! Merge engine
//!
//! - `classify` - map platform failures to merge errors (pure)
//! - `lock` - per-PR mutual exclusion across runs
//! - `poll` - bounded backoff for eventually consistent re-reads
//! - `execute` - the mutating merge sequence (effectful)

mod classify;
mod execute;
mod lock;
mod poll;

pub use classify::{MergeErrorKind, classify_error, classify_merge_failure};
pub use execute::{MergeExecutor, MergeOutcome};
pub use lock::{MergeLock, MergeLockGuard};
pub use poll::{PollPolicy, poll_until};
