//! vaultpress CLI
//!
//! Imports an Obsidian table, syncs selected rows to the site, and writes
//! and publishes newsletter issues.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use vaultpress_cli::{CliArgs, app};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    app::run(args).await?;
    Ok(())
}
