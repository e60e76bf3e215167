//! PR-by-commit resolution

use crate::platform::PlatformService;
use tracing::{debug, warn};

/// Find the PR a commit belongs to.
///
/// Returns the first PR in the platform's ordering. An empty association
/// list and a failed lookup both resolve to `None`.
pub async fn resolve_pr_for_commit(platform: &dyn PlatformService, commit_sha: &str) -> Option<u64> {
    match platform.find_associated_prs(commit_sha).await {
        Ok(numbers) => {
            let first = numbers.first().copied();
            debug!(commit_sha, candidates = ?numbers, resolved = ?first, "resolved PR for commit");
            first
        }
        Err(e) => {
            warn!(commit_sha, error = %e, "associated PR lookup failed");
            None
        }
    }
}
