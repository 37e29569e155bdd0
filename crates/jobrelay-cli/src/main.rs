//! `jobrelay` binary entry point.

use anyhow::{Context, Result};
use clap::Parser;

use jobrelay_cli::Cli;
use jobrelay_core::DispatchConfig;
use jobrelay_core::observability::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format.into());

    let config = DispatchConfig::from_env().context("invalid job configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(jobrelay_cli::run(&cli, config))
}
