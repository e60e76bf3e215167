//! Platform services for the code host
//!
//! The merge automation only talks to the host through [`PlatformService`],
//! so the decision logic can be driven by a mock in tests.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    BranchMerge, CommitStatusState, EligibilityFields, MergeResult, PlatformConfig,
    PullRequestSnapshot,
};
use async_trait::async_trait;

/// Platform service trait for PR reads and mutations
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Read a PR's branches, head SHA and mergeability.
    ///
    /// Review decision and check state may be left empty here; they are
    /// supplied by [`query_eligibility_fields`](Self::query_eligibility_fields).
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequestSnapshot>;

    /// Query the live merged/state/review/check fields in one round-trip
    async fn query_eligibility_fields(&self, pr_number: u64) -> Result<EligibilityFields>;

    /// PR numbers associated with a commit, in the platform's order
    async fn find_associated_prs(&self, commit_sha: &str) -> Result<Vec<u64>>;

    /// Create a comment on a PR (or issue)
    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<()>;

    /// Set a commit status on `sha` under `context`
    async fn set_commit_status(
        &self,
        sha: &str,
        state: CommitStatusState,
        context: &str,
        description: &str,
    ) -> Result<()>;

    /// Squash-merge a PR with the given commit message.
    ///
    /// Failures with an HTTP status are returned as
    /// [`Error::PlatformRejected`](crate::error::Error::PlatformRejected).
    async fn squash_merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeResult>;

    /// Merge branch `head` into branch `base`.
    ///
    /// Anything but a newly created merge commit (including "nothing to
    /// merge") is returned as
    /// [`Error::PlatformRejected`](crate::error::Error::PlatformRejected).
    async fn merge_branch(&self, base: &str, head: &str, commit_message: &str)
    -> Result<BranchMerge>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
