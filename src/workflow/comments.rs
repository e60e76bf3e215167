//! Comment bodies posted on pull requests

use crate::error::Error;
use crate::merge::MergeOutcome;

/// Posted when a PR is opened
pub fn init_comment() -> String {
    "Manual merging is disabled. To start merging process use the slash command */merge-it* in a new comment. \
     That will trigger testing pipeline and merging."
        .to_string()
}

/// Posted after the PR was handed to the test queue
pub fn enqueued_comment(test_branch: &str) -> String {
    format!(
        ":hourglass: This pull request is eligible and has been queued for testing on `{test_branch}`. \
         It will be merged automatically once the pipeline passes."
    )
}

/// Posted after a successful merge
pub fn merged_comment(outcome: &MergeOutcome, base_branch: &str) -> String {
    match &outcome.sha {
        Some(sha) => format!(":white_check_mark: Merged into `{base_branch}` as {sha}."),
        None => format!(":white_check_mark: Merged into `{base_branch}`."),
    }
}

/// Posted when the PR turned out to be merged already
pub fn already_merged_comment() -> String {
    ":information_source: This pull request has already been merged, nothing to do.".to_string()
}

/// Posted when a run fails
pub fn error_comment(error: &Error) -> String {
    format!(":x: Merge automation failed: {error}")
}
