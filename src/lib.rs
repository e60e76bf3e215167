//! merge-gate: chat-ops merge automation for GitHub pull requests
//!
//! A workflow run names one action (`prinit`, `merge-it`, `merge-now`,
//! `merge-pr`). The [`workflow::Dispatcher`] fetches the PR, evaluates
//! [`eligibility`], and either reports the blocking problems, hands the PR
//! to the external test queue ([`pipeline`]), or merges it
//! ([`merge::MergeExecutor`]).

pub mod auth;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod platform;
pub mod resolve;
pub mod types;
pub mod workflow;
