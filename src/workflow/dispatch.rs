//! Workflow dispatcher - runs exactly one action per invocation
//!
//! Every handler error ends up here: it is reported as a PR comment when a
//! PR is known and then returned so the host marks the run as failed. The
//! dispatcher never retries.

use crate::config::WorkflowConfig;
use crate::eligibility::{ProblemCode, evaluate, fetch_snapshot};
use crate::error::{Error, Result};
use crate::merge::{MergeExecutor, MergeLock, MergeOutcome};
use crate::pipeline::{EnqueueRequest, TestQueue};
use crate::platform::PlatformService;
use crate::resolve::resolve_pr_for_commit;
use crate::types::CommitStatusState;
use crate::workflow::ActionRequest;
use crate::workflow::comments::{
    already_merged_comment, enqueued_comment, error_comment, init_comment, merged_comment,
};
use tracing::{error, info, warn};

/// Description of the pending status set on new PRs
const INIT_STATUS_DESCRIPTION: &str = "Waiting for the merge command";

/// What a successful dispatch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Pending status set and policy comment posted
    Initialized {
        /// PR number
        pr_number: u64,
    },
    /// PR handed to the test queue
    Enqueued {
        /// PR number
        pr_number: u64,
    },
    /// PR not eligible; one comment posted per problem
    Blocked {
        /// PR number
        pr_number: u64,
        /// Problems in evaluation order
        problems: Vec<ProblemCode>,
    },
    /// Merge attempted
    Merged(MergeOutcome),
}

/// Maps an [`ActionRequest`] to the components that carry it out
pub struct Dispatcher<'a> {
    config: &'a WorkflowConfig,
    platform: &'a dyn PlatformService,
    queue: Option<&'a dyn TestQueue>,
    lock: &'a MergeLock,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher.
    ///
    /// `queue` may be `None` when no queue is configured; `merge-it` then
    /// fails with a configuration error.
    pub const fn new(
        config: &'a WorkflowConfig,
        platform: &'a dyn PlatformService,
        queue: Option<&'a dyn TestQueue>,
        lock: &'a MergeLock,
    ) -> Self {
        Self {
            config,
            platform,
            queue,
            lock,
        }
    }

    /// Run one action to completion
    pub async fn dispatch(&self, request: &ActionRequest) -> Result<DispatchOutcome> {
        let action = request.action();
        info!(%action, "dispatching workflow action");

        let mut pr_number = request.pr_number();
        let result = match request {
            ActionRequest::Init { pr_number } => self.init(*pr_number).await,
            ActionRequest::RequestTest { pr_number } => self.request_test(*pr_number).await,
            ActionRequest::ForceMerge { pr_number } => self.force_merge(*pr_number).await,
            ActionRequest::CommitMerge { commit_sha } => {
                match resolve_pr_for_commit(self.platform, commit_sha).await {
                    Some(resolved) => {
                        pr_number = Some(resolved);
                        self.force_merge(resolved).await
                    }
                    None => Err(Error::PrNotFoundForCommit(commit_sha.clone())),
                }
            }
        };

        match &result {
            Ok(outcome) => info!(%action, ?outcome, "workflow action finished"),
            Err(e) => {
                error!(%action, pr_number = ?pr_number, error = %e, "workflow action failed");
                if let Some(pr) = pr_number
                    && e.is_commentable()
                {
                    self.report_error(pr, e).await;
                }
            }
        }
        result
    }

    async fn init(&self, pr_number: u64) -> Result<DispatchOutcome> {
        let snapshot = self.platform.get_pull_request(pr_number).await?;
        self.platform
            .set_commit_status(
                &snapshot.head_sha,
                CommitStatusState::Pending,
                &self.config.status_context,
                INIT_STATUS_DESCRIPTION,
            )
            .await?;
        self.platform
            .create_comment(pr_number, &init_comment())
            .await?;
        Ok(DispatchOutcome::Initialized { pr_number })
    }

    async fn request_test(&self, pr_number: u64) -> Result<DispatchOutcome> {
        if let Some(blocked) = self.check_eligibility(pr_number).await? {
            return Ok(blocked);
        }

        let queue = self.queue.ok_or_else(|| {
            Error::Config("no queue url configured, cannot request a test run".to_string())
        })?;

        let platform = self.platform.config();
        queue
            .enqueue(&EnqueueRequest {
                owner: platform.owner.clone(),
                repo: platform.repo.clone(),
                pr: pr_number,
                test_branch: self.config.trigger_branch.clone(),
                base_branch: self.config.base_branch.clone(),
            })
            .await?;

        self.platform
            .create_comment(pr_number, &enqueued_comment(&self.config.trigger_branch))
            .await?;
        Ok(DispatchOutcome::Enqueued { pr_number })
    }

    async fn force_merge(&self, pr_number: u64) -> Result<DispatchOutcome> {
        if let Some(blocked) = self.check_eligibility(pr_number).await? {
            return Ok(blocked);
        }

        let executor = MergeExecutor::new(self.platform, self.config, self.lock);
        let outcome = executor.execute(pr_number).await?;

        let comment = if outcome.was_already_merged() {
            already_merged_comment()
        } else {
            merged_comment(&outcome, &self.config.base_branch)
        };
        self.platform.create_comment(pr_number, &comment).await?;

        Ok(DispatchOutcome::Merged(outcome))
    }

    /// Evaluate a fresh snapshot; when blocked, comment each problem in
    /// order and return the blocked outcome.
    async fn check_eligibility(&self, pr_number: u64) -> Result<Option<DispatchOutcome>> {
        let snapshot = fetch_snapshot(self.platform, pr_number).await?;
        let eligibility = evaluate(&snapshot);

        if eligibility.is_eligible() {
            info!(pr_number, "PR is eligible");
            return Ok(None);
        }

        info!(pr_number, problems = ?eligibility.problems(), "PR is not eligible");
        for problem in eligibility.problems() {
            self.platform
                .create_comment(pr_number, problem.message())
                .await?;
        }

        Ok(Some(DispatchOutcome::Blocked {
            pr_number,
            problems: eligibility.problems().to_vec(),
        }))
    }

    /// Best-effort error comment; a failure here must not mask `err`
    async fn report_error(&self, pr_number: u64, err: &Error) {
        if let Err(comment_err) = self
            .platform
            .create_comment(pr_number, &error_comment(err))
            .await
        {
            warn!(pr_number, error = %comment_err, "failed to post error comment");
        }
    }
}
