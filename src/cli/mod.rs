//! Command-line inputs and the run entry point

mod context;

use anyhow::Result;
use clap::Parser;
use context::RunContext;
use merge_gate::workflow::{DispatchOutcome, Dispatcher};
use std::path::PathBuf;
use tracing::info;

/// Chat-ops merge automation for GitHub pull requests
#[derive(Parser, Debug)]
#[command(name = "merge-gate")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Action to run: prinit, merge-it, merge-now or merge-pr
    #[arg(long, env = "INPUT_WORKFLOW_ACTION")]
    pub action: String,

    /// GitHub token (falls back to GITHUB_TOKEN, GH_TOKEN, then `gh auth token`)
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: String,

    /// Pull request number (read from the event payload when absent)
    #[arg(long)]
    pub pr: Option<u64>,

    /// Commit SHA that triggered the run
    #[arg(long, env = "GITHUB_SHA")]
    pub sha: Option<String>,

    /// Path to the triggering event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,

    /// Branch pull requests are merged into
    #[arg(long, env = "INPUT_BASE_BRANCH", default_value = merge_gate::config::DEFAULT_BASE_BRANCH)]
    pub base_branch: String,

    /// Branch the test pipeline runs on
    #[arg(long, env = "INPUT_TRIGGER_BRANCH", default_value = merge_gate::config::DEFAULT_TRIGGER_BRANCH)]
    pub trigger_branch: String,

    /// Endpoint that accepts test requests
    #[arg(long, env = "INPUT_QUEUE_URL")]
    pub queue_url: Option<String>,

    /// GitHub Enterprise host
    #[arg(long, env = "INPUT_GITHUB_HOST")]
    pub host: Option<String>,

    /// Merge the base branch into the head before merging
    #[arg(long, env = "INPUT_SYNC_BASE")]
    pub sync_base: bool,

    /// Directory for per-PR merge locks
    #[arg(long, env = "RUNNER_TEMP")]
    pub lock_dir: Option<PathBuf>,

    /// Context name for commit statuses
    #[arg(long, default_value = merge_gate::config::DEFAULT_STATUS_CONTEXT)]
    pub status_context: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the requested action
pub async fn run(args: Args) -> Result<DispatchOutcome> {
    let ctx = RunContext::new(args).await?;

    let dispatcher = Dispatcher::new(
        &ctx.config,
        &ctx.platform,
        ctx.queue.as_ref().map(|q| q as &dyn merge_gate::pipeline::TestQueue),
        &ctx.lock,
    );
    let outcome = dispatcher.dispatch(&ctx.request).await?;

    info!(action = %ctx.request.action(), "workflow run succeeded");
    Ok(outcome)
}

/// Escape a message for a workflow command (`::error::...`)
pub fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
