//! Binary crate for the `scrapecast` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Serving the pipeline over HTTP
//! - Human-friendly output formatting

use clap::Parser;

mod cli;
mod render;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cmd = cli::Cli::parse();
    cli::init_tracing(&cmd.log_level);
    cmd.run().await
}
