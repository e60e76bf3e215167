//! Run configuration
//!
//! Everything the workflow needs is folded into one immutable
//! [`WorkflowConfig`] at startup and passed down by reference.

use crate::error::{Error, Result};
use crate::merge::PollPolicy;
use crate::types::PlatformConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default base branch
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Default branch used to correlate test pipeline runs
pub const DEFAULT_TRIGGER_BRANCH: &str = "merge-queue";

/// Default commit status context
pub const DEFAULT_STATUS_CONTEXT: &str = "merge-gate";

/// Commit message used for automated squash merges
pub const DEFAULT_MERGE_MESSAGE: &str = "Merged automatically by merge-gate";

/// Locks older than this are considered abandoned
const DEFAULT_LOCK_STALE_AFTER: Duration = Duration::from_secs(10 * 60);

/// Immutable configuration for one run
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Repository coordinates
    pub platform: PlatformConfig,
    /// Branch PRs are merged into
    pub base_branch: String,
    /// Branch the external test pipeline runs on
    pub trigger_branch: String,
    /// Queueing endpoint for test requests
    pub queue_url: Option<Url>,
    /// Context name for commit statuses written by the automation
    pub status_context: String,
    /// Commit message for squash merges
    pub merge_commit_message: String,
    /// Merge the base branch into the head before squash-merging
    pub sync_base_branch: bool,
    /// Backoff policy for waiting on eventual consistency
    pub poll: PollPolicy,
    /// Directory holding per-PR merge locks
    pub lock_dir: PathBuf,
    /// Age after which a merge lock is reclaimed
    pub lock_stale_after: Duration,
}

impl WorkflowConfig {
    /// Create a configuration with defaults for everything but the repository
    pub fn new(platform: PlatformConfig) -> Self {
        Self {
            platform,
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            trigger_branch: DEFAULT_TRIGGER_BRANCH.to_string(),
            queue_url: None,
            status_context: DEFAULT_STATUS_CONTEXT.to_string(),
            merge_commit_message: DEFAULT_MERGE_MESSAGE.to_string(),
            sync_base_branch: false,
            poll: PollPolicy::default(),
            lock_dir: std::env::temp_dir(),
            lock_stale_after: DEFAULT_LOCK_STALE_AFTER,
        }
    }

    /// Check that the configured names are usable
    pub fn validate(&self) -> Result<()> {
        if self.base_branch.trim().is_empty() {
            return Err(Error::Config("base branch must not be empty".to_string()));
        }
        if self.trigger_branch.trim().is_empty() {
            return Err(Error::Config("trigger branch must not be empty".to_string()));
        }
        if self.status_context.trim().is_empty() {
            return Err(Error::Config("status context must not be empty".to_string()));
        }
        if let Some(url) = &self.queue_url
            && !matches!(url.scheme(), "http" | "https")
        {
            return Err(Error::Config(format!(
                "queue url must be http(s), got `{url}`"
            )));
        }
        Ok(())
    }
}

/// The parts of a workflow event payload merge-gate reads
#[derive(Debug, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pull_request: Option<NumberedItem>,
    #[serde(default)]
    issue: Option<NumberedItem>,
}

#[derive(Debug, Deserialize)]
struct NumberedItem {
    number: u64,
}

impl EventPayload {
    /// Parse a payload from JSON text
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid event payload: {e}")))
    }

    /// Load a payload from the file the CI host provides
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read event payload {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// PR number from `pull_request.number`, else `issue.number`
    pub fn pr_number(&self) -> Option<u64> {
        self.pull_request
            .as_ref()
            .or(self.issue.as_ref())
            .map(|item| item.number)
    }
}
