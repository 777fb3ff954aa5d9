//! tvguide - browse a TV channel catalog and program guide
//!
//! # Usage
//!
//! ```bash
//! tvguide --channels-url https://tv.example.com/channels.json categories
//! tvguide channels Sports
//! tvguide star 42
//! tvguide watch --ticks 3
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tvguide::cli::Cli;
use tvguide::commands;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    commands::run(cli).await.into()
}
