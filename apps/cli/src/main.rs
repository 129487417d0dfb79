//! vulnfeed CLI: security-advisory feed normalization tool.
//!
//! Converts Known Exploited Vulnerabilities feed snapshots into
//! provenance-stamped entities for a vulnerability-matching store.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
