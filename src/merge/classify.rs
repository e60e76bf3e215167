//! Classification of platform merge failures

use crate::error::Error;

/// Kind of merge failure surfaced to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeErrorKind {
    /// Head already merged into base
    AlreadyMerged,
    /// A branch involved in the merge is missing
    BranchNotFound,
    /// Head and base conflict
    Conflict,
    /// Any other merge failure
    MergeFailed,
}

impl MergeErrorKind {
    /// Kind for a classified error, `None` for non-merge errors
    pub const fn of(error: &Error) -> Option<Self> {
        match error {
            Error::AlreadyMerged => Some(Self::AlreadyMerged),
            Error::BranchNotFound { .. } => Some(Self::BranchNotFound),
            Error::Conflict { .. } => Some(Self::Conflict),
            Error::MergeFailed(_) => Some(Self::MergeFailed),
            _ => None,
        }
    }
}

/// Map a platform merge failure to the user-facing error (PURE).
///
/// `204` means nothing to merge, `404` a missing branch, `409` a conflict.
pub fn classify_merge_failure(status: u16, message: &str, head: &str, base: &str) -> Error {
    match status {
        204 => Error::AlreadyMerged,
        404 => Error::BranchNotFound {
            head: head.to_string(),
            base: base.to_string(),
        },
        409 => Error::Conflict {
            head: head.to_string(),
            base: base.to_string(),
        },
        _ => Error::MergeFailed(format!("{message} (HTTP {status})")),
    }
}

/// Classify `err` if it is a raw platform rejection, pass anything else through
pub fn classify_error(err: Error, head: &str, base: &str) -> Error {
    match err {
        Error::PlatformRejected { status, message } => {
            classify_merge_failure(status, &message, head, base)
        }
        other => other,
    }
}
