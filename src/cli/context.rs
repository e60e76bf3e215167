//! Shared setup for a run
//!
//! Turns the raw inputs into the pieces the dispatcher borrows: one
//! immutable config, the platform client, the optional test queue, the
//! merge lock and the action request.

use super::Args;
use anyhow::{Context, Result};
use merge_gate::auth::get_github_auth;
use merge_gate::config::{EventPayload, WorkflowConfig};
use merge_gate::error::Error;
use merge_gate::merge::MergeLock;
use merge_gate::pipeline::HttpTestQueue;
use merge_gate::platform::GitHubService;
use merge_gate::types::PlatformConfig;
use merge_gate::workflow::{ActionRequest, WorkflowAction};
use tracing::debug;
use url::Url;

/// Everything a run needs, built once
pub struct RunContext {
    /// Immutable run configuration
    pub config: WorkflowConfig,
    /// GitHub client
    pub platform: GitHubService,
    /// Test queue, when a queue URL is configured
    pub queue: Option<HttpTestQueue>,
    /// Per-PR merge lock
    pub lock: MergeLock,
    /// What to do
    pub request: ActionRequest,
}

impl RunContext {
    /// Validate inputs, then resolve credentials and build clients.
    ///
    /// Input problems are reported before any network or credential lookup.
    pub async fn new(args: Args) -> Result<Self> {
        let action: WorkflowAction = args.action.parse()?;

        let platform_config = PlatformConfig::from_slug(&args.repository, args.host.clone())
            .ok_or_else(|| {
                Error::Config(format!(
                    "repository must be owner/repo, got `{}`",
                    args.repository
                ))
            })?;

        let pr_number = match args.pr {
            Some(pr) => Some(pr),
            None => match &args.event_path {
                Some(path) => EventPayload::load(path)?.pr_number(),
                None => None,
            },
        };
        let request = ActionRequest::new(action, pr_number, args.sha.as_deref())?;

        let queue_url = args
            .queue_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|raw| {
                Url::parse(raw).map_err(|e| Error::Config(format!("invalid queue url `{raw}`: {e}")))
            })
            .transpose()?;

        let mut config = WorkflowConfig::new(platform_config.clone());
        config.base_branch = args.base_branch;
        config.trigger_branch = args.trigger_branch;
        config.queue_url = queue_url;
        config.status_context = args.status_context;
        config.sync_base_branch = args.sync_base;
        if let Some(dir) = args.lock_dir {
            config.lock_dir = dir;
        }
        config.validate()?;

        let auth = get_github_auth(args.token.as_deref()).await?;
        debug!(source = ?auth.source, "resolved GitHub token");

        let platform = GitHubService::new(&auth.token, platform_config)
            .context("failed to create GitHub client")?;
        let queue = config.queue_url.clone().map(HttpTestQueue::new).transpose()?;
        let lock = MergeLock::new(&config.lock_dir, config.lock_stale_after);

        Ok(Self {
            config,
            platform,
            queue,
            lock,
            request,
        })
    }
}
