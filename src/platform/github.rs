//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    BranchMerge, CheckState, CommitStatusState, EligibilityFields, MergeResult, MergeableState,
    PlatformConfig, PrState, PullRequestSnapshot, ReviewDecision,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default request timeout in seconds for raw HTTP calls
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ELIGIBILITY_QUERY: &str = r"
    query EligibilityFields($owner: String!, $repo: String!, $number: Int!) {
        repository(owner: $owner, name: $repo) {
            pullRequest(number: $number) {
                merged
                state
                reviewDecision
                commits(last: 1) {
                    nodes {
                        commit {
                            statusCheckRollup {
                                state
                            }
                        }
                    }
                }
            }
        }
    }
";

// GraphQL response types for the eligibility query

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct EligibilityData {
    repository: Option<GraphQlRepository>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlRepository {
    pull_request: Option<GraphQlPullRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlPullRequest {
    merged: bool,
    state: PrState,
    review_decision: Option<ReviewDecision>,
    commits: GraphQlCommitConnection,
}

#[derive(Deserialize)]
struct GraphQlCommitConnection {
    nodes: Vec<GraphQlCommitNode>,
}

#[derive(Deserialize)]
struct GraphQlCommitNode {
    commit: GraphQlCommit,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlCommit {
    status_check_rollup: Option<GraphQlRollup>,
}

#[derive(Deserialize)]
struct GraphQlRollup {
    state: String,
}

impl From<GraphQlPullRequest> for EligibilityFields {
    fn from(pr: GraphQlPullRequest) -> Self {
        let last_commit_check_state = pr
            .commits
            .nodes
            .last()
            .and_then(|node| node.commit.status_check_rollup.as_ref())
            .map(|rollup| CheckState::from_api(&rollup.state));

        Self {
            merged: pr.merged,
            state: pr.state,
            review_decision: pr.review_decision,
            last_commit_check_state,
        }
    }
}

// REST payloads not covered by octocrab models

#[derive(Deserialize)]
struct AssociatedPullRequest {
    number: u64,
}

#[derive(Serialize)]
struct MergeBranchPayload<'a> {
    base: &'a str,
    head: &'a str,
    commit_message: &'a str,
}

#[derive(Deserialize)]
struct MergeCommit {
    sha: String,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests (GraphQL, branch merges)
    token: String,
    /// HTTP client for raw requests (GraphQL, branch merges)
    http_client: Client,
    /// REST API base URL, without trailing slash
    api_base: String,
    /// GraphQL endpoint, which lives outside `/api/v3` on Enterprise hosts
    graphql_url: String,
}

impl GitHubService {
    /// Create a new GitHub service for github.com or a GitHub Enterprise host
    pub fn new(token: &str, config: PlatformConfig) -> Result<Self> {
        let api_base = config.host.as_ref().map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        Self::with_api_base(token, config, &api_base)
    }

    /// Create a service against an explicit REST API base URL.
    ///
    /// The GraphQL endpoint is derived from it: `/api/v3` becomes
    /// `/api/graphql`, anything else gets `/graphql` appended.
    pub fn with_api_base(token: &str, config: PlatformConfig, api_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();
        let graphql_url = graphql_endpoint(&api_base);

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(&api_base)
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("merge-gate")
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            token: token.to_string(),
            http_client,
            api_base,
            graphql_url,
        })
    }
}

fn graphql_endpoint(api_base: &str) -> String {
    api_base.strip_suffix("/api/v3").map_or_else(
        || format!("{api_base}/graphql"),
        |host| format!("{host}/api/graphql"),
    )
}

/// Map a failed read into the query error the dispatcher reports
fn query_error(what: &str, err: octocrab::Error) -> Error {
    match Error::from(err) {
        Error::GitHubApi(msg) => Error::UpstreamQuery(format!("{what}: {msg}")),
        other => other,
    }
}

/// Keep the HTTP status of a failed mutation so merge code can classify it
fn rejection(err: octocrab::Error) -> Error {
    match err {
        octocrab::Error::GitHub { source, .. } => Error::PlatformRejected {
            status: source.status_code.as_u16(),
            message: source.message.clone(),
        },
        other => Error::from(other),
    }
}

fn mergeable_state_from_octocrab(
    state: Option<&octocrab::models::pulls::MergeableState>,
) -> MergeableState {
    use octocrab::models::pulls::MergeableState as Api;
    match state {
        Some(Api::Clean) => MergeableState::Clean,
        Some(Api::Blocked) => MergeableState::Blocked,
        Some(Api::Behind) => MergeableState::Behind,
        Some(Api::Dirty) => MergeableState::Dirty,
        // draft, unstable, has_hooks and anything newer are never auto-merged
        Some(_) | None => MergeableState::Unknown,
    }
}

fn is_commit_sha(sha: &str) -> bool {
    (4..=64).contains(&sha.len()) && sha.chars().all(|c| c.is_ascii_hexdigit())
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequestSnapshot> {
        debug!(pr_number, "getting pull request");

        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .get(pr_number)
            .await
            .map_err(|e| query_error("failed to fetch pull request", e))?;

        let merged = pr.merged.unwrap_or(false) || pr.merged_at.is_some();
        let state = match pr.state {
            Some(octocrab::models::IssueState::Open) => PrState::Open,
            _ if merged => PrState::Merged,
            // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
            Some(_) | None => PrState::Closed,
        };

        let snapshot = PullRequestSnapshot {
            number: pr.number,
            head_ref: pr.head.ref_field.clone(),
            head_sha: pr.head.sha.clone(),
            base_ref: pr.base.ref_field.clone(),
            merged,
            mergeable: pr.mergeable.unwrap_or(false),
            mergeable_state: mergeable_state_from_octocrab(pr.mergeable_state.as_ref()),
            review_decision: None,
            state,
            last_commit_check_state: None,
        };

        debug!(
            pr_number,
            head_sha = %snapshot.head_sha,
            mergeable_state = %snapshot.mergeable_state,
            "got pull request"
        );
        Ok(snapshot)
    }

    async fn query_eligibility_fields(&self, pr_number: u64) -> Result<EligibilityFields> {
        debug!(pr_number, "querying eligibility fields");

        let response = self
            .http_client
            .post(&self.graphql_url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&serde_json::json!({
                "query": ELIGIBILITY_QUERY,
                "variables": {
                    "owner": self.config.owner,
                    "repo": self.config.repo,
                    "number": pr_number,
                }
            }))
            .send()
            .await
            .map_err(|e| Error::UpstreamQuery(format!("eligibility query failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamQuery(format!(
                "eligibility query failed: HTTP {status}"
            )));
        }

        let response: GraphQlResponse<EligibilityData> = response.json().await.map_err(|e| {
            Error::UpstreamQuery(format!("failed to parse eligibility response: {e}"))
        })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::UpstreamQuery(format!(
                "GraphQL error: {}",
                messages.join(", ")
            )));
        }

        let pr = response
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.pull_request)
            .ok_or_else(|| {
                Error::UpstreamQuery(format!("pull request #{pr_number} not found"))
            })?;

        let fields = EligibilityFields::from(pr);
        debug!(pr_number, ?fields, "queried eligibility fields");
        Ok(fields)
    }

    async fn find_associated_prs(&self, commit_sha: &str) -> Result<Vec<u64>> {
        debug!(commit_sha, "finding PRs associated with commit");

        if !is_commit_sha(commit_sha) {
            return Err(Error::UpstreamQuery(format!(
                "`{commit_sha}` is not a commit SHA"
            )));
        }

        let route = format!(
            "/repos/{}/{}/commits/{commit_sha}/pulls",
            self.config.owner, self.config.repo
        );
        let prs: Vec<AssociatedPullRequest> = self
            .client
            .get(route, None::<&()>)
            .await
            .map_err(|e| query_error("failed to list associated pull requests", e))?;

        let numbers: Vec<u64> = prs.into_iter().map(|pr| pr.number).collect();
        debug!(commit_sha, count = numbers.len(), "found associated PRs");
        Ok(numbers)
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<()> {
        debug!(issue_number, "creating comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .create_comment(issue_number, body)
            .await?;
        debug!(issue_number, "created comment");
        Ok(())
    }

    async fn set_commit_status(
        &self,
        sha: &str,
        state: CommitStatusState,
        context: &str,
        description: &str,
    ) -> Result<()> {
        debug!(sha, %state, context, "setting commit status");

        let api_state = match state {
            CommitStatusState::Pending => octocrab::models::StatusState::Pending,
            CommitStatusState::Success => octocrab::models::StatusState::Success,
            CommitStatusState::Failure => octocrab::models::StatusState::Failure,
        };

        self.client
            .repos(&self.config.owner, &self.config.repo)
            .create_status(sha.to_string(), api_state)
            .context(context.to_string())
            .description(description.to_string())
            .send()
            .await?;

        debug!(sha, %state, "set commit status");
        Ok(())
    }

    async fn squash_merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeResult> {
        debug!(pr_number, "squash-merging PR");

        let result = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .merge(pr_number)
            .method(octocrab::params::pulls::MergeMethod::Squash)
            .title(format!("{commit_message} (#{pr_number})"))
            .message(commit_message.to_string())
            .send()
            .await
            .map_err(rejection)?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "squash-merge complete"
        );
        Ok(merge_result)
    }

    async fn merge_branch(
        &self,
        base: &str,
        head: &str,
        commit_message: &str,
    ) -> Result<BranchMerge> {
        debug!(base, head, "merging branch");

        let url = format!(
            "{}/repos/{}/{}/merges",
            self.api_base, self.config.owner, self.config.repo
        );

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&MergeBranchPayload {
                base,
                head,
                commit_message,
            })
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to merge branches: {e}")))?;

        let status = response.status();
        if status == StatusCode::CREATED {
            let commit: MergeCommit = response
                .json()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to parse merge commit: {e}")))?;
            debug!(base, head, sha = %commit.sha, "merged branch");
            return Ok(BranchMerge { sha: commit.sha });
        }

        // 204 carries no body: nothing to merge
        let message = if status == StatusCode::NO_CONTENT {
            "nothing to merge".to_string()
        } else {
            response.json::<ApiMessage>().await.map_or_else(
                |_| status.canonical_reason().unwrap_or("unknown error").to_string(),
                |m| m.message,
            )
        };

        debug!(base, head, status = status.as_u16(), %message, "branch merge rejected");
        Err(Error::PlatformRejected {
            status: status.as_u16(),
            message,
        })
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
