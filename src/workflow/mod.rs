//! Workflow actions and the dispatcher that runs them

mod comments;
mod dispatch;

pub use comments::{
    already_merged_comment, enqueued_comment, error_comment, init_comment, merged_comment,
};
pub use dispatch::{DispatchOutcome, Dispatcher};

use crate::error::{Error, Result};
use std::str::FromStr;

/// Orchestration mode requested by the triggering workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    /// `prinit`: mark a new PR as pending and explain the merge command
    Init,
    /// `merge-it`: check eligibility and enqueue for testing
    RequestTest,
    /// `merge-now`: check eligibility and merge immediately
    ForceMerge,
    /// `merge-pr`: merge the PR a pushed commit belongs to
    CommitMerge,
}

impl WorkflowAction {
    /// Input name of the action
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "prinit",
            Self::RequestTest => "merge-it",
            Self::ForceMerge => "merge-now",
            Self::CommitMerge => "merge-pr",
        }
    }
}

impl FromStr for WorkflowAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "prinit" => Ok(Self::Init),
            "merge-it" => Ok(Self::RequestTest),
            "merge-now" => Ok(Self::ForceMerge),
            "merge-pr" => Ok(Self::CommitMerge),
            other => Err(Error::UnsupportedAction(other.to_string())),
        }
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An action together with the identifier it operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    /// Initialize a PR
    Init {
        /// PR number
        pr_number: u64,
    },
    /// Request a test run for a PR
    RequestTest {
        /// PR (or issue) number the command was posted on
        pr_number: u64,
    },
    /// Merge a PR now
    ForceMerge {
        /// PR number
        pr_number: u64,
    },
    /// Merge the PR associated with a commit
    CommitMerge {
        /// Triggering commit SHA
        commit_sha: String,
    },
}

impl ActionRequest {
    /// Pair `action` with the identifier it needs
    pub fn new(
        action: WorkflowAction,
        pr_number: Option<u64>,
        commit_sha: Option<&str>,
    ) -> Result<Self> {
        let require_pr = || {
            pr_number.ok_or_else(|| {
                Error::MissingInput(format!("`{action}` needs a pull request number"))
            })
        };

        Ok(match action {
            WorkflowAction::Init => Self::Init {
                pr_number: require_pr()?,
            },
            WorkflowAction::RequestTest => Self::RequestTest {
                pr_number: require_pr()?,
            },
            WorkflowAction::ForceMerge => Self::ForceMerge {
                pr_number: require_pr()?,
            },
            WorkflowAction::CommitMerge => {
                let sha = commit_sha
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        Error::MissingInput(format!("`{action}` needs a commit SHA"))
                    })?;
                Self::CommitMerge {
                    commit_sha: sha.to_string(),
                }
            }
        })
    }

    /// The action this request runs
    pub const fn action(&self) -> WorkflowAction {
        match self {
            Self::Init { .. } => WorkflowAction::Init,
            Self::RequestTest { .. } => WorkflowAction::RequestTest,
            Self::ForceMerge { .. } => WorkflowAction::ForceMerge,
            Self::CommitMerge { .. } => WorkflowAction::CommitMerge,
        }
    }

    /// PR number known before any lookup
    pub const fn pr_number(&self) -> Option<u64> {
        match self {
            Self::Init { pr_number }
            | Self::RequestTest { pr_number }
            | Self::ForceMerge { pr_number } => Some(*pr_number),
            Self::CommitMerge { .. } => None,
        }
    }
}
