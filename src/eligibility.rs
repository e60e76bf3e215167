//! Merge eligibility - pure evaluation of a PR snapshot
//!
//! [`evaluate`] does no I/O. [`fetch_snapshot`] is the one effectful helper
//! that assembles the snapshot it consumes.

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{CheckState, MergeableState, PrState, PullRequestSnapshot, ReviewDecision};
use tracing::debug;

/// A reason a PR cannot be merged automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemCode {
    /// PR is already merged
    AlreadyMerged,
    /// Head is behind the base branch
    OutOfDate,
    /// Head conflicts with the base branch
    Conflict,
    /// PR is not open
    NotOpen,
    /// PR is not approved
    NotApproved,
    /// Latest commit has failing checks
    FailingChecks,
    /// Mergeability not confirmed by the platform (still computing, or a
    /// state merge-gate does not act on). Only reported when no other
    /// problem applies.
    NotMergeable,
}

impl ProblemCode {
    /// User-facing explanation posted as a PR comment
    pub const fn message(self) -> &'static str {
        match self {
            Self::AlreadyMerged => "This pull request has already been merged.",
            Self::OutOfDate => {
                "This branch is out of date with the base branch. Update it with the latest changes and try again."
            }
            Self::Conflict => {
                "This branch has conflicts that must be resolved. Rebase or merge the base branch and try again."
            }
            Self::NotOpen => "This pull request is not open.",
            Self::NotApproved => "This pull request has not been approved yet.",
            Self::FailingChecks => {
                "Checks on the latest commit are failing. Fix them and try again."
            }
            Self::NotMergeable => {
                "GitHub has not confirmed that this pull request can be merged yet. Try again in a moment."
            }
        }
    }
}

impl std::fmt::Display for ProblemCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AlreadyMerged => "already-merged",
            Self::OutOfDate => "out-of-date",
            Self::Conflict => "conflict",
            Self::NotOpen => "not-open",
            Self::NotApproved => "not-approved",
            Self::FailingChecks => "failing-checks",
            Self::NotMergeable => "not-mergeable",
        };
        f.write_str(name)
    }
}

/// Verdict for one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityResult {
    eligible: bool,
    problems: Vec<ProblemCode>,
}

impl EligibilityResult {
    /// Whether the PR may be merged automatically
    pub const fn is_eligible(&self) -> bool {
        self.eligible
    }

    /// Blocking problems in evaluation order, empty iff eligible
    pub fn problems(&self) -> &[ProblemCode] {
        &self.problems
    }
}

/// Evaluate a snapshot against the fixed rule set (PURE).
///
/// Rules are checked in priority order and accumulate. The positive
/// condition is re-checked independently so that a mergeable state outside
/// `clean`/`blocked` is never eligible even when no named rule fires; that
/// case is reported as [`ProblemCode::NotMergeable`].
#[must_use]
pub fn evaluate(snapshot: &PullRequestSnapshot) -> EligibilityResult {
    let mut problems = Vec::new();

    if snapshot.merged {
        problems.push(ProblemCode::AlreadyMerged);
    }
    if snapshot.mergeable_state == MergeableState::Behind {
        problems.push(ProblemCode::OutOfDate);
    }
    if snapshot.mergeable_state == MergeableState::Dirty {
        problems.push(ProblemCode::Conflict);
    }
    // a merged PR is reported as merged, not also as closed
    let closed_by_merge = snapshot.merged && snapshot.state == PrState::Merged;
    if snapshot.state != PrState::Open && !closed_by_merge {
        problems.push(ProblemCode::NotOpen);
    }
    if snapshot.review_decision != Some(ReviewDecision::Approved) {
        problems.push(ProblemCode::NotApproved);
    }
    // absent check state counts as pending, which does not block
    if snapshot.last_commit_check_state == Some(CheckState::Failure) {
        problems.push(ProblemCode::FailingChecks);
    }

    let positive = snapshot.mergeable
        && matches!(
            snapshot.mergeable_state,
            MergeableState::Blocked | MergeableState::Clean
        )
        && snapshot.state == PrState::Open
        && snapshot.review_decision == Some(ReviewDecision::Approved)
        && snapshot.last_commit_check_state != Some(CheckState::Failure);

    if problems.is_empty() && !positive {
        problems.push(ProblemCode::NotMergeable);
    }

    EligibilityResult {
        eligible: problems.is_empty(),
        problems,
    }
}

/// Fetch a PR and overlay freshly queried review/merge fields (EFFECTFUL)
pub async fn fetch_snapshot(
    platform: &dyn PlatformService,
    pr_number: u64,
) -> Result<PullRequestSnapshot> {
    let snapshot = platform.get_pull_request(pr_number).await?;
    let fields = platform.query_eligibility_fields(pr_number).await?;
    let snapshot = snapshot.with_eligibility_fields(fields);
    debug!(pr_number, ?snapshot, "assembled PR snapshot");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eligible_snapshot() -> PullRequestSnapshot {
        PullRequestSnapshot {
            number: 1,
            head_ref: "feature/x".to_string(),
            head_sha: "abc123".to_string(),
            base_ref: "main".to_string(),
            merged: false,
            mergeable: true,
            mergeable_state: MergeableState::Blocked,
            review_decision: Some(ReviewDecision::Approved),
            state: PrState::Open,
            last_commit_check_state: Some(CheckState::Success),
        }
    }

    #[test]
    fn test_eligible_blocked_pr() {
        let result = evaluate(&eligible_snapshot());
        assert!(result.is_eligible());
        assert!(result.problems().is_empty());
    }

    #[test]
    fn test_eligible_clean_pr() {
        let snapshot = PullRequestSnapshot {
            mergeable_state: MergeableState::Clean,
            ..eligible_snapshot()
        };
        assert!(evaluate(&snapshot).is_eligible());
    }

    #[test]
    fn test_missing_check_state_is_pending() {
        let snapshot = PullRequestSnapshot {
            last_commit_check_state: None,
            ..eligible_snapshot()
        };
        assert!(evaluate(&snapshot).is_eligible());
    }

    #[test]
    fn test_unknown_state_is_not_mergeable() {
        let snapshot = PullRequestSnapshot {
            mergeable_state: MergeableState::Unknown,
            ..eligible_snapshot()
        };
        let result = evaluate(&snapshot);
        assert!(!result.is_eligible());
        assert_eq!(result.problems(), &[ProblemCode::NotMergeable]);
    }

    #[test]
    fn test_not_mergeable_only_when_nothing_else_fires() {
        let snapshot = PullRequestSnapshot {
            mergeable_state: MergeableState::Unknown,
            review_decision: None,
            ..eligible_snapshot()
        };
        assert_eq!(evaluate(&snapshot).problems(), &[ProblemCode::NotApproved]);
    }

    #[test]
    fn test_mergeable_flag_false_is_not_eligible() {
        let snapshot = PullRequestSnapshot {
            mergeable: false,
            ..eligible_snapshot()
        };
        let result = evaluate(&snapshot);
        assert!(!result.is_eligible());
        assert_eq!(result.problems(), &[ProblemCode::NotMergeable]);
    }

    #[test]
    fn test_problems_accumulate_in_priority_order() {
        let snapshot = PullRequestSnapshot {
            merged: true,
            mergeable_state: MergeableState::Dirty,
            state: PrState::Closed,
            review_decision: Some(ReviewDecision::ChangesRequested),
            last_commit_check_state: Some(CheckState::Failure),
            ..eligible_snapshot()
        };
        assert_eq!(
            evaluate(&snapshot).problems(),
            &[
                ProblemCode::AlreadyMerged,
                ProblemCode::Conflict,
                ProblemCode::NotOpen,
                ProblemCode::NotApproved,
                ProblemCode::FailingChecks,
            ]
        );
    }

    #[test]
    fn test_merged_pr_is_not_also_reported_closed() {
        let snapshot = PullRequestSnapshot {
            merged: true,
            state: PrState::Merged,
            ..eligible_snapshot()
        };
        assert_eq!(evaluate(&snapshot).problems(), &[ProblemCode::AlreadyMerged]);
    }

    #[test]
    fn test_merged_state_without_merged_flag_is_not_open() {
        let snapshot = PullRequestSnapshot {
            state: PrState::Merged,
            ..eligible_snapshot()
        };
        assert_eq!(evaluate(&snapshot).problems(), &[ProblemCode::NotOpen]);
    }

    #[test]
    fn test_behind_is_out_of_date() {
        let snapshot = PullRequestSnapshot {
            mergeable_state: MergeableState::Behind,
            ..eligible_snapshot()
        };
        assert_eq!(evaluate(&snapshot).problems(), &[ProblemCode::OutOfDate]);
    }

    #[test]
    fn test_review_required_is_not_approved() {
        let snapshot = PullRequestSnapshot {
            review_decision: Some(ReviewDecision::ReviewRequired),
            ..eligible_snapshot()
        };
        assert_eq!(evaluate(&snapshot).problems(), &[ProblemCode::NotApproved]);

        let snapshot = PullRequestSnapshot {
            review_decision: None,
            ..eligible_snapshot()
        };
        assert_eq!(evaluate(&snapshot).problems(), &[ProblemCode::NotApproved]);
    }

    #[test]
    fn test_problem_messages_are_distinct() {
        let all = [
            ProblemCode::AlreadyMerged,
            ProblemCode::OutOfDate,
            ProblemCode::Conflict,
            ProblemCode::NotOpen,
            ProblemCode::NotApproved,
            ProblemCode::FailingChecks,
            ProblemCode::NotMergeable,
        ];
        let messages: std::collections::HashSet<_> = all.iter().map(|p| p.message()).collect();
        assert_eq!(messages.len(), all.len());
    }
}
