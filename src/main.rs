//! merge-gate - merge automation entry point

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();

    let default_filter = if args.verbose {
        "merge_gate=debug"
    } else {
        "merge_gate=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli::run(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            // workflow command: fails the step with this message
            println!("::error::{}", cli::escape_workflow_data(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}
