//! Entry point for chatwire, a terminal chat client for streamed completions.
//!
//! Loads environment variables, parses CLI arguments via [`cli`], sets up
//! logging, and dispatches to the chosen subcommand.

mod approval;
mod chat;
mod cli;
mod config;
mod constants;
mod error;
mod format;
mod history;
mod logging;
mod message;
mod output;
mod provider;
mod session;
mod stream;
mod tools;
mod transcript;

use std::process::ExitCode;

use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = cli::parse();
    logging::init(cli.verbose);
    cli::run(cli).await
}
