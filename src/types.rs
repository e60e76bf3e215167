//! Core types for merge-gate

use serde::{Deserialize, Serialize};

/// Repository coordinates on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

impl PlatformConfig {
    /// Parse an `owner/repo` slug, as found in `GITHUB_REPOSITORY`
    pub fn from_slug(slug: &str, host: Option<String>) -> Option<Self> {
        let (owner, repo) = slug.trim().trim_end_matches('/').split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            host,
        })
    }
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
    /// PR is open
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// Platform-computed merge readiness of a PR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeableState {
    /// No conflicts, all requirements satisfied
    Clean,
    /// Mergeable once branch protection requirements are met
    Blocked,
    /// Head is out of date with the base branch
    Behind,
    /// Merge conflicts with the base branch
    Dirty,
    /// Not yet computed, or a state merge-gate does not recognize
    Unknown,
}

impl MergeableState {
    /// Map the platform's `mergeable_state` string
    pub fn from_api(value: &str) -> Self {
        match value {
            "clean" => Self::Clean,
            "blocked" => Self::Blocked,
            "behind" => Self::Behind,
            "dirty" => Self::Dirty,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for MergeableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Blocked => write!(f, "blocked"),
            Self::Behind => write!(f, "behind"),
            Self::Dirty => write!(f, "dirty"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Aggregate reviewer verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    /// Approved by the required reviewers
    Approved,
    /// A reviewer requested changes
    ChangesRequested,
    /// Review still required
    ReviewRequired,
}

/// Combined check state of the latest commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckState {
    /// All checks passed
    Success,
    /// At least one check failed or errored
    Failure,
    /// Checks still running or expected
    Pending,
}

impl CheckState {
    /// Map a GraphQL `StatusState` value
    pub fn from_api(value: &str) -> Self {
        match value {
            "SUCCESS" => Self::Success,
            "FAILURE" | "ERROR" => Self::Failure,
            _ => Self::Pending,
        }
    }
}

/// Commit status states merge-gate writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatusState {
    /// Waiting for the merge automation
    Pending,
    /// Cleared for merge
    Success,
    /// Automation failed
    Failure,
}

impl std::fmt::Display for CommitStatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Point-in-time read of a PR's mergeability and review state.
///
/// Built once per evaluation and never refreshed piecemeal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSnapshot {
    /// PR number
    pub number: u64,
    /// Head branch name
    pub head_ref: String,
    /// Head commit SHA
    pub head_sha: String,
    /// Base branch name
    pub base_ref: String,
    /// Whether the PR has been merged
    pub merged: bool,
    /// Platform's mergeable flag (false while still computing)
    pub mergeable: bool,
    /// Platform's mergeable state
    pub mergeable_state: MergeableState,
    /// Aggregate review decision, if any review policy applies
    pub review_decision: Option<ReviewDecision>,
    /// Current PR state
    pub state: PrState,
    /// Check state of the latest commit, if any checks reported
    pub last_commit_check_state: Option<CheckState>,
}

impl PullRequestSnapshot {
    /// Overlay the live review/merge fields onto this snapshot
    #[must_use]
    pub fn with_eligibility_fields(mut self, fields: EligibilityFields) -> Self {
        self.merged = fields.merged;
        self.state = fields.state;
        self.review_decision = fields.review_decision;
        self.last_commit_check_state = fields.last_commit_check_state;
        self
    }
}

/// Live review/merge fields re-queried at evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityFields {
    /// Whether the PR has been merged
    pub merged: bool,
    /// Current PR state
    pub state: PrState,
    /// Aggregate review decision
    pub review_decision: Option<ReviewDecision>,
    /// Check state of the latest commit
    pub last_commit_check_state: Option<CheckState>,
}

/// Result of a squash-merge call
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge commit created by a branch-into-branch merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchMerge {
    /// SHA of the new merge commit
    pub sha: String,
}
