//! Mock platform service and test queue
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use merge_gate::error::{Error, Result};
use merge_gate::pipeline::{EnqueueRequest, TestQueue};
use merge_gate::platform::PlatformService;
use merge_gate::types::{
    BranchMerge, CheckState, CommitStatusState, EligibilityFields, MergeResult, MergeableState,
    PlatformConfig, PrState, PullRequestSnapshot, ReviewDecision,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Call record for `create_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `set_commit_status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCall {
    pub sha: String,
    pub state: CommitStatusState,
    pub context: String,
    pub description: String,
}

/// Call record for `squash_merge_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashCall {
    pub pr_number: u64,
    pub commit_message: String,
}

/// Call record for `merge_branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeBranchCall {
    pub base: String,
    pub head: String,
    pub commit_message: String,
}

/// Hand-written mock of `PlatformService`
///
/// Features:
/// - Configurable snapshots and eligibility fields per PR
/// - Scripted `get_pull_request` sequences for polling
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    snapshots: Mutex<HashMap<u64, PullRequestSnapshot>>,
    snapshot_sequences: Mutex<HashMap<u64, VecDeque<PullRequestSnapshot>>>,
    eligibility_fields: Mutex<HashMap<u64, EligibilityFields>>,
    associated_prs: Mutex<HashMap<String, Vec<u64>>>,
    squash_responses: Mutex<HashMap<u64, MergeResult>>,
    // Call tracking
    get_pr_calls: Mutex<Vec<u64>>,
    eligibility_calls: Mutex<Vec<u64>>,
    find_associated_calls: Mutex<Vec<String>>,
    comment_calls: Mutex<Vec<CommentCall>>,
    status_calls: Mutex<Vec<StatusCall>>,
    squash_calls: Mutex<Vec<SquashCall>>,
    merge_branch_calls: Mutex<Vec<MergeBranchCall>>,
    // Error injection
    error_on_eligibility: Mutex<Option<String>>,
    error_on_find_associated: Mutex<Option<String>>,
    error_on_comment: Mutex<Option<String>>,
    error_on_squash: Mutex<Option<(u16, String)>>,
    error_on_merge_branch: Mutex<Option<(u16, String)>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            snapshots: Mutex::new(HashMap::new()),
            snapshot_sequences: Mutex::new(HashMap::new()),
            eligibility_fields: Mutex::new(HashMap::new()),
            associated_prs: Mutex::new(HashMap::new()),
            squash_responses: Mutex::new(HashMap::new()),
            get_pr_calls: Mutex::new(Vec::new()),
            eligibility_calls: Mutex::new(Vec::new()),
            find_associated_calls: Mutex::new(Vec::new()),
            comment_calls: Mutex::new(Vec::new()),
            status_calls: Mutex::new(Vec::new()),
            squash_calls: Mutex::new(Vec::new()),
            merge_branch_calls: Mutex::new(Vec::new()),
            error_on_eligibility: Mutex::new(None),
            error_on_find_associated: Mutex::new(None),
            error_on_comment: Mutex::new(None),
            error_on_squash: Mutex::new(None),
            error_on_merge_branch: Mutex::new(None),
        }
    }

    // === Error injection methods ===

    /// Make `query_eligibility_fields` return an error
    pub fn fail_eligibility_query(&self, msg: &str) {
        *self.error_on_eligibility.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `find_associated_prs` return an error
    pub fn fail_find_associated(&self, msg: &str) {
        *self.error_on_find_associated.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_comment` return an error
    pub fn fail_comment(&self, msg: &str) {
        *self.error_on_comment.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `squash_merge_pr` fail with an HTTP status
    pub fn fail_squash_merge(&self, status: u16, msg: &str) {
        *self.error_on_squash.lock().unwrap() = Some((status, msg.to_string()));
    }

    /// Make `merge_branch` fail with an HTTP status
    pub fn fail_merge_branch(&self, status: u16, msg: &str) {
        *self.error_on_merge_branch.lock().unwrap() = Some((status, msg.to_string()));
    }

    // === Response setup ===

    /// Set the snapshot returned by `get_pull_request`
    pub fn set_snapshot(&self, snapshot: PullRequestSnapshot) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.number, snapshot);
    }

    /// Script successive `get_pull_request` responses; the last one repeats
    pub fn set_snapshot_sequence(&self, pr_number: u64, sequence: Vec<PullRequestSnapshot>) {
        self.snapshot_sequences
            .lock()
            .unwrap()
            .insert(pr_number, sequence.into());
    }

    /// Override the fields returned by `query_eligibility_fields`
    pub fn set_eligibility_fields(&self, pr_number: u64, fields: EligibilityFields) {
        self.eligibility_fields
            .lock()
            .unwrap()
            .insert(pr_number, fields);
    }

    /// Set the PRs associated with a commit
    pub fn set_associated_prs(&self, sha: &str, prs: Vec<u64>) {
        self.associated_prs
            .lock()
            .unwrap()
            .insert(sha.to_string(), prs);
    }

    /// Set the response for `squash_merge_pr`
    pub fn set_squash_response(&self, pr_number: u64, result: MergeResult) {
        self.squash_responses
            .lock()
            .unwrap()
            .insert(pr_number, result);
    }

    /// Helper to set up an open, approved, green, clean PR
    pub fn setup_eligible_pr(&self, pr_number: u64, head_ref: &str) {
        self.set_snapshot(eligible_snapshot(pr_number, head_ref));
    }

    // === Call verification methods ===

    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    pub fn get_eligibility_calls(&self) -> Vec<u64> {
        self.eligibility_calls.lock().unwrap().clone()
    }

    pub fn get_find_associated_calls(&self) -> Vec<String> {
        self.find_associated_calls.lock().unwrap().clone()
    }

    pub fn get_comment_calls(&self) -> Vec<CommentCall> {
        self.comment_calls.lock().unwrap().clone()
    }

    /// Comment bodies in posting order
    pub fn comment_bodies(&self) -> Vec<String> {
        self.get_comment_calls().into_iter().map(|c| c.body).collect()
    }

    pub fn get_status_calls(&self) -> Vec<StatusCall> {
        self.status_calls.lock().unwrap().clone()
    }

    pub fn get_squash_calls(&self) -> Vec<SquashCall> {
        self.squash_calls.lock().unwrap().clone()
    }

    pub fn get_merge_branch_calls(&self) -> Vec<MergeBranchCall> {
        self.merge_branch_calls.lock().unwrap().clone()
    }

    /// Assert that `squash_merge_pr` was called for a specific PR
    pub fn assert_merge_called(&self, pr_number: u64) {
        let calls = self.get_squash_calls();
        assert!(
            calls.iter().any(|c| c.pr_number == pr_number),
            "Expected squash_merge_pr({pr_number}) but got: {calls:?}"
        );
    }

    /// Assert that `squash_merge_pr` was never called
    pub fn assert_merge_not_called(&self) {
        let calls = self.get_squash_calls();
        assert!(
            calls.is_empty(),
            "Expected no squash_merge_pr calls but got: {calls:?}"
        );
    }

    /// Assert that no mutating call was made
    pub fn assert_no_mutations(&self) {
        assert!(self.get_comment_calls().is_empty(), "unexpected comments");
        assert!(self.get_status_calls().is_empty(), "unexpected statuses");
        assert!(self.get_squash_calls().is_empty(), "unexpected merges");
        assert!(
            self.get_merge_branch_calls().is_empty(),
            "unexpected branch merges"
        );
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequestSnapshot> {
        self.get_pr_calls.lock().unwrap().push(pr_number);

        if let Some(sequence) = self.snapshot_sequences.lock().unwrap().get_mut(&pr_number) {
            let next = if sequence.len() > 1 {
                sequence.pop_front()
            } else {
                sequence.front().cloned()
            };
            if let Some(snapshot) = next {
                return Ok(snapshot);
            }
        }

        self.snapshots
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .ok_or_else(|| Error::UpstreamQuery(format!("pull request #{pr_number} not found")))
    }

    async fn query_eligibility_fields(&self, pr_number: u64) -> Result<EligibilityFields> {
        self.eligibility_calls.lock().unwrap().push(pr_number);

        if let Some(msg) = self.error_on_eligibility.lock().unwrap().as_ref() {
            return Err(Error::UpstreamQuery(msg.clone()));
        }

        if let Some(fields) = self.eligibility_fields.lock().unwrap().get(&pr_number) {
            return Ok(*fields);
        }

        let snapshots = self.snapshots.lock().unwrap();
        let snapshot = snapshots
            .get(&pr_number)
            .ok_or_else(|| Error::UpstreamQuery(format!("pull request #{pr_number} not found")))?;
        Ok(EligibilityFields {
            merged: snapshot.merged,
            state: snapshot.state,
            review_decision: snapshot.review_decision,
            last_commit_check_state: snapshot.last_commit_check_state,
        })
    }

    async fn find_associated_prs(&self, commit_sha: &str) -> Result<Vec<u64>> {
        self.find_associated_calls
            .lock()
            .unwrap()
            .push(commit_sha.to_string());

        if let Some(msg) = self.error_on_find_associated.lock().unwrap().as_ref() {
            return Err(Error::UpstreamQuery(msg.clone()));
        }

        Ok(self
            .associated_prs
            .lock()
            .unwrap()
            .get(commit_sha)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<()> {
        if let Some(msg) = self.error_on_comment.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        self.comment_calls.lock().unwrap().push(CommentCall {
            pr_number: issue_number,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn set_commit_status(
        &self,
        sha: &str,
        state: CommitStatusState,
        context: &str,
        description: &str,
    ) -> Result<()> {
        self.status_calls.lock().unwrap().push(StatusCall {
            sha: sha.to_string(),
            state,
            context: context.to_string(),
            description: description.to_string(),
        });
        Ok(())
    }

    async fn squash_merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeResult> {
        self.squash_calls.lock().unwrap().push(SquashCall {
            pr_number,
            commit_message: commit_message.to_string(),
        });

        if let Some((status, msg)) = self.error_on_squash.lock().unwrap().as_ref() {
            return Err(Error::PlatformRejected {
                status: *status,
                message: msg.clone(),
            });
        }

        Ok(self
            .squash_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_else(|| MergeResult {
                merged: true,
                sha: Some(format!("merged_sha_{pr_number}")),
                message: None,
            }))
    }

    async fn merge_branch(
        &self,
        base: &str,
        head: &str,
        commit_message: &str,
    ) -> Result<BranchMerge> {
        self.merge_branch_calls.lock().unwrap().push(MergeBranchCall {
            base: base.to_string(),
            head: head.to_string(),
            commit_message: commit_message.to_string(),
        });

        if let Some((status, msg)) = self.error_on_merge_branch.lock().unwrap().as_ref() {
            return Err(Error::PlatformRejected {
                status: *status,
                message: msg.clone(),
            });
        }

        Ok(BranchMerge {
            sha: format!("sync_{base}"),
        })
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

/// Call-recording test queue
#[derive(Default)]
pub struct MockTestQueue {
    requests: Mutex<Vec<EnqueueRequest>>,
    error: Mutex<Option<String>>,
}

impl MockTestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `enqueue` fail
    pub fn fail_enqueue(&self, msg: &str) {
        *self.error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn get_requests(&self) -> Vec<EnqueueRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestQueue for MockTestQueue {
    async fn enqueue(&self, request: &EnqueueRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(msg) = self.error.lock().unwrap().as_ref() {
            return Err(Error::UpstreamEnqueue(msg.clone()));
        }
        Ok(())
    }
}

/// Snapshot that passes every eligibility rule
pub fn eligible_snapshot(number: u64, head_ref: &str) -> PullRequestSnapshot {
    PullRequestSnapshot {
        number,
        head_ref: head_ref.to_string(),
        head_sha: format!("head_sha_{number}"),
        base_ref: "main".to_string(),
        merged: false,
        mergeable: true,
        mergeable_state: MergeableState::Clean,
        review_decision: Some(ReviewDecision::Approved),
        state: PrState::Open,
        last_commit_check_state: Some(CheckState::Success),
    }
}
