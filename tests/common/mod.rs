//! Shared test helpers

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::*;

use merge_gate::config::WorkflowConfig;
use merge_gate::merge::{MergeLock, PollPolicy};
use merge_gate::types::PlatformConfig;
use std::path::Path;
use std::time::Duration;

/// Platform config for acme/widgets on github.com
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
        host: None,
    }
}

/// Poll policy that gives up quickly
pub fn fast_poll() -> PollPolicy {
    PollPolicy {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        multiplier: 2.0,
        timeout: Duration::from_millis(200),
    }
}

/// Workflow config with a queue URL, fast polling and locks under `lock_dir`
pub fn test_config(lock_dir: &Path) -> WorkflowConfig {
    let mut config = WorkflowConfig::new(github_config());
    config.queue_url = Some("https://queue.example.com/enqueue".parse().unwrap());
    config.poll = fast_poll();
    config.lock_dir = lock_dir.to_path_buf();
    config
}

/// Merge lock matching `config`
pub fn test_lock(config: &WorkflowConfig) -> MergeLock {
    MergeLock::new(&config.lock_dir, config.lock_stale_after)
}
