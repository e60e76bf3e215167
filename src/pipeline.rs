//! Pipeline trigger - hands eligible PRs to the external test queue
//!
//! The enqueue call is fire-and-forget: success means the queue accepted the
//! request, not that the tests ran.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Payload submitted to the queueing service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// PR number
    pub pr: u64,
    /// Branch the test pipeline runs on
    pub test_branch: String,
    /// Branch the PR merges into
    pub base_branch: String,
}

/// External queue accepting test requests
#[async_trait]
pub trait TestQueue: Send + Sync {
    /// Submit a request, succeeding once the queue has accepted it
    async fn enqueue(&self, request: &EnqueueRequest) -> Result<()>;
}

/// Queue reached with a JSON `POST`
pub struct HttpTestQueue {
    client: Client,
    url: Url,
}

impl HttpTestQueue {
    /// Create a queue client for `url`
    pub fn new(url: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent("merge-gate")
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::UpstreamEnqueue(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TestQueue for HttpTestQueue {
    async fn enqueue(&self, request: &EnqueueRequest) -> Result<()> {
        debug!(url = %self.url, pr = request.pr, "enqueueing PR for testing");

        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::UpstreamEnqueue(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            return Err(Error::UpstreamEnqueue(if body.is_empty() {
                format!("queue returned HTTP {status}")
            } else {
                format!("queue returned HTTP {status}: {body}")
            }));
        }

        debug!(pr = request.pr, status = status.as_u16(), "PR enqueued");
        Ok(())
    }
}
