//! Merge execution - effectful operations
//!
//! Runs the mutating merge sequence for a PR that already passed
//! eligibility, and turns platform failures into classified errors.

use crate::config::WorkflowConfig;
use crate::error::{Error, Result};
use crate::merge::classify::{MergeErrorKind, classify_error};
use crate::merge::lock::MergeLock;
use crate::merge::poll::poll_until;
use crate::platform::PlatformService;
use crate::types::{CommitStatusState, MergeableState, PullRequestSnapshot};
use tracing::{debug, info};

/// Description attached to the head commit right before merging
const MERGE_STATUS_DESCRIPTION: &str = "Cleared for merge";

/// Result of a merge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// PR the attempt was for
    pub pr_number: u64,
    /// Squash commit SHA, when the merge happened in this run
    pub sha: Option<String>,
    /// Non-fatal failure kind (only [`MergeErrorKind::AlreadyMerged`])
    pub error_kind: Option<MergeErrorKind>,
}

impl MergeOutcome {
    fn merged(pr_number: u64, sha: Option<String>) -> Self {
        Self {
            pr_number,
            sha,
            error_kind: None,
        }
    }

    fn already_merged(pr_number: u64) -> Self {
        Self {
            pr_number,
            sha: None,
            error_kind: Some(MergeErrorKind::AlreadyMerged),
        }
    }

    /// Whether this run merged the PR
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error_kind.is_none()
    }

    /// Whether the PR turned out to be merged already
    #[must_use]
    pub fn was_already_merged(&self) -> bool {
        self.error_kind == Some(MergeErrorKind::AlreadyMerged)
    }
}

/// Performs merges against the platform
pub struct MergeExecutor<'a> {
    platform: &'a dyn PlatformService,
    config: &'a WorkflowConfig,
    lock: &'a MergeLock,
}

impl<'a> MergeExecutor<'a> {
    /// Create an executor
    pub const fn new(
        platform: &'a dyn PlatformService,
        config: &'a WorkflowConfig,
        lock: &'a MergeLock,
    ) -> Self {
        Self {
            platform,
            config,
            lock,
        }
    }

    /// Merge `pr_number` into the configured base branch (EFFECTFUL).
    ///
    /// Holds the PR's merge lock for the whole sequence. An already merged PR
    /// is a normal outcome, every other failure is an error.
    pub async fn execute(&self, pr_number: u64) -> Result<MergeOutcome> {
        let _guard = self.lock.acquire(pr_number)?;

        // time may have passed since eligibility was checked
        let mut snapshot = self.platform.get_pull_request(pr_number).await?;
        if snapshot.merged {
            info!(pr_number, "PR already merged, nothing to do");
            return Ok(MergeOutcome::already_merged(pr_number));
        }

        if self.config.sync_base_branch {
            snapshot = self.sync_base_into_head(snapshot).await?;
            // another run may have merged it while we waited
            if snapshot.merged {
                info!(pr_number, "PR merged during base sync, nothing to do");
                return Ok(MergeOutcome::already_merged(pr_number));
            }
        }

        self.platform
            .set_commit_status(
                &snapshot.head_sha,
                CommitStatusState::Success,
                &self.config.status_context,
                MERGE_STATUS_DESCRIPTION,
            )
            .await?;

        let head = snapshot.head_ref.as_str();
        let base = self.config.base_branch.as_str();

        info!(pr_number, head, base, "squash-merging PR");
        let result = match self
            .platform
            .squash_merge_pr(pr_number, &self.config.merge_commit_message)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                return match classify_error(e, head, base) {
                    Error::AlreadyMerged => {
                        info!(pr_number, "platform reports PR already merged");
                        Ok(MergeOutcome::already_merged(pr_number))
                    }
                    other => Err(other),
                };
            }
        };

        if !result.merged {
            return Err(Error::MergeFailed(
                result
                    .message
                    .unwrap_or_else(|| "GitHub did not merge the pull request".to_string()),
            ));
        }

        info!(pr_number, sha = ?result.sha, "merged PR");
        Ok(MergeOutcome::merged(pr_number, result.sha))
    }

    /// Merge the base branch into the PR head, then wait for the platform to
    /// reflect the new head before returning a fresh snapshot. A snapshot
    /// that shows the PR merged also ends the wait.
    async fn sync_base_into_head(
        &self,
        snapshot: PullRequestSnapshot,
    ) -> Result<PullRequestSnapshot> {
        let pr_branch = snapshot.head_ref.as_str();
        let base_branch = self.config.base_branch.as_str();
        let message = format!("Merge {base_branch} into {pr_branch}");

        debug!(pr_number = snapshot.number, pr_branch, base_branch, "syncing base into head");
        // the PR branch is the merge target here, the base branch the source
        match self
            .platform
            .merge_branch(pr_branch, base_branch, &message)
            .await
        {
            Ok(commit) => {
                debug!(sha = %commit.sha, "base merged into head");
            }
            Err(e) => match classify_error(e, pr_branch, base_branch) {
                // nothing to merge: head already contains base
                Error::AlreadyMerged => {
                    debug!(pr_branch, base_branch, "head already up to date with base");
                    return Ok(snapshot);
                }
                other => return Err(other),
            },
        }

        let previous_sha = snapshot.head_sha;
        let pr_number = snapshot.number;
        poll_until(
            &self.config.poll,
            "the pull request to pick up the updated head",
            || self.platform.get_pull_request(pr_number),
            |pr| {
                pr.merged
                    || (pr.head_sha != previous_sha
                        && pr.mergeable_state != MergeableState::Unknown)
            },
        )
        .await
    }
}
