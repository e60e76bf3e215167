//! Error types for merge-gate

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the merge automation
///
/// The first block mirrors the failure taxonomy reported to users; the rest
/// covers setup and infrastructure failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Read-side platform query failed (REST or GraphQL)
    #[error("failed to query GitHub: {0}")]
    UpstreamQuery(String),

    /// Submitting the PR to the external test queue failed
    #[error("failed to enqueue pull request for testing: {0}")]
    UpstreamEnqueue(String),

    /// The head has already been merged into the base
    #[error("head has already been merged")]
    AlreadyMerged,

    /// One of the branches involved in the merge does not exist
    #[error("branch not found while merging `{head}` into `{base}`")]
    BranchNotFound {
        /// Branch being merged
        head: String,
        /// Branch being merged into
        base: String,
    },

    /// The merge produced conflicts
    #[error(
        "merge conflict between `{head}` and `{base}`: rebase or update `{head}` with the latest `{base}` and try again"
    )]
    Conflict {
        /// Branch being merged
        head: String,
        /// Branch being merged into
        base: String,
    },

    /// The platform refused the merge for an unclassified reason
    #[error("merge failed: {0}")]
    MergeFailed(String),

    /// No pull request is associated with the triggering commit
    #[error("no pull request associated with commit {0}")]
    PrNotFoundForCommit(String),

    /// Workflow action name is not one of the supported actions
    #[error("unsupported workflow action: `{0}` (expected prinit, merge-it, merge-now or merge-pr)")]
    UnsupportedAction(String),

    /// A mutating platform call failed with an HTTP status.
    ///
    /// Merge code classifies these into the specific merge errors above.
    #[error("GitHub rejected the request (HTTP {status}): {message}")]
    PlatformRejected {
        /// HTTP status code reported by the platform
        status: u16,
        /// Platform-provided message
        message: String,
    },

    /// Other GitHub API failure
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// No usable authentication token
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A required action input was not provided
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Another run currently holds the merge lock for this PR
    #[error("another merge of pull request #{0} is already in progress")]
    MergeInProgress(u64),

    /// Merge lock storage failed
    #[error("merge lock error: {0}")]
    Lock(String),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => Self::GitHubApi(format!(
                "{} (HTTP {})",
                source.message,
                source.status_code.as_u16()
            )),
            other => Self::GitHubApi(other.to_string()),
        }
    }
}

impl Error {
    /// Whether a comment can usefully be posted for this error.
    ///
    /// Lookup failures for the commit have no PR to comment on.
    pub const fn is_commentable(&self) -> bool {
        !matches!(self, Self::PrNotFoundForCommit(_) | Self::Auth(_))
    }
}
