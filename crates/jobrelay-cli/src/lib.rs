//! # jobrelay-cli
//!
//! CI entry point that enqueues one workflow job on Google Cloud Tasks.
//!
//! ## Configuration
//!
//! Job parameters come from the environment only:
//!
//! - `COMMIT_HASH`, `CLASSES`, `PULL_REQUEST_NUMBER`
//! - `PROJECT_ID`, `LOCATION`, `QUEUE_ID`
//! - `WORKFLOW_URL`, `SERVICE_ACCOUNT_EMAIL`
//! - optionally `AUTH_TOKEN_TYPE`, `AUTH_AUDIENCE`, `AUTH_SCOPE`
//!
//! Flags below only change how the job is sent.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use jobrelay_core::DispatchConfig;
use jobrelay_core::dispatcher::{JobDispatcher, PreparedDispatch};
use jobrelay_core::observability::LogFormat;
use jobrelay_core::queue::cloud_tasks::{
    CloudTasksClient, CloudTasksClientConfig, DEFAULT_API_BASE,
};
use jobrelay_core::queue::memory::InMemoryTaskQueue;

/// Enqueue a CI job as a Cloud Tasks HTTP task.
#[derive(Debug, Parser)]
#[command(name = "jobrelay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Build the task and print it without contacting Cloud Tasks.
    #[arg(long, env = "JOBRELAY_DRY_RUN")]
    pub dry_run: bool,

    /// Log output format.
    #[arg(long, env = "JOBRELAY_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Cloud Tasks API base URL.
    #[arg(long, env = "JOBRELAY_API_ENDPOINT", default_value = DEFAULT_API_BASE)]
    pub api_endpoint: String,

    /// HTTP timeout for the task creation call, in seconds.
    #[arg(long, env = "JOBRELAY_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Log format flag values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable logs.
    #[default]
    Pretty,
    /// JSON structured logs.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

impl Cli {
    /// Returns the Cloud Tasks connection settings.
    #[must_use]
    pub fn client_config(&self) -> CloudTasksClientConfig {
        CloudTasksClientConfig::default()
            .with_api_base(self.api_endpoint.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Dispatches the job described by `config`.
///
/// # Errors
///
/// Returns an error if the task cannot be built or the queue rejects it.
pub async fn run(cli: &Cli, config: DispatchConfig) -> Result<()> {
    if cli.dry_run {
        return dry_run(config).await;
    }

    let client = CloudTasksClient::new(cli.client_config())
        .await
        .context("failed to create Cloud Tasks client")?;
    let dispatcher = JobDispatcher::new(config, client);

    dispatcher
        .dispatch()
        .await
        .with_context(|| format!("failed to enqueue task on {}", dispatcher.config().queue_path()))?;

    Ok(())
}

async fn dry_run(config: DispatchConfig) -> Result<()> {
    let dispatcher = JobDispatcher::new(config, InMemoryTaskQueue::new());
    let prepared = dispatcher.prepare()?;

    println!("{}", render_dry_run(&prepared)?);

    let created = dispatcher.submit(&prepared).await?;
    tracing::info!(task = %created.name, "dry run complete; nothing was sent");
    Ok(())
}

/// Renders the request that would be sent, with its decoded envelope.
///
/// # Errors
///
/// Returns an error if the request cannot be serialized.
pub fn render_dry_run(prepared: &PreparedDispatch) -> Result<String> {
    let rendered = serde_json::json!({
        "queuePath": prepared.request.queue_path,
        "request": prepared.request.to_json()?,
        "envelope": prepared.envelope,
        "payload": prepared.payload,
    });
    Ok(serde_json::to_string_pretty(&rendered)?)
}
