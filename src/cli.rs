//! CLI - Command Line Interface for tvguide
//!
//! The command line is the presentation layer over the store: it bootstraps
//! the catalog, then prints derived views. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # List categories and browse one
//! tvguide categories
//! tvguide channels Sports --json
//!
//! # Manage starred channels
//! tvguide star 42
//! tvguide starred
//!
//! # Keep the store live and print the clock
//! tvguide watch --ticks 5
//! ```

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments or configuration
    InvalidArgs = 2,
    /// Network error or rejected fetch
    NetworkError = 3,
    /// Category or channel not found
    NotFound = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// tvguide - browse a TV channel catalog and program guide
#[derive(Parser, Debug)]
#[command(
    name = "tvguide",
    version,
    about = "Browse a TV channel catalog and program guide",
    after_help = "EXAMPLES:\n\
                  tvguide categories                  List channel categories\n\
                  tvguide channels Sports             Channels in a category\n\
                  tvguide star 42                     Star or unstar a channel\n\
                  tvguide starred --json              Starred channels as JSON"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Channel catalog endpoint (overrides config and environment)
    #[arg(long, global = true)]
    pub channels_url: Option<String>,

    /// Program guide endpoint (overrides config and environment)
    #[arg(long, global = true)]
    pub epg_url: Option<String>,

    /// Storage file for starred channels
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Log filter directive implied by `-v`
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List channel categories
    #[command(visible_alias = "cats")]
    Categories,

    /// List channels in a category
    #[command(visible_alias = "ls")]
    Channels(ChannelsCmd),

    /// Show one channel with its guide entry
    #[command(visible_alias = "ch")]
    Channel(ChannelCmd),

    /// List starred channels
    Starred,

    /// Star or unstar a channel
    Star(StarCmd),

    /// Keep the store live and print the clock on every tick
    Watch(WatchCmd),

    /// Show the resolved configuration, optionally saving it
    Config(ConfigCmd),
}

impl Command {
    /// Whether the command needs the remote catalog
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Command::Star(_) | Command::Config(_))
    }
}

/// List channels of a category
#[derive(Args, Debug)]
pub struct ChannelsCmd {
    /// Category name (defaults to the first category)
    pub category: Option<String>,
}

/// Show a single channel
#[derive(Args, Debug)]
pub struct ChannelCmd {
    /// Channel id
    #[arg(required = true)]
    pub id: String,
}

/// Toggle a channel in the starred collection
#[derive(Args, Debug)]
pub struct StarCmd {
    /// Channel id
    #[arg(required = true)]
    pub id: String,
}

/// Run the clock
#[derive(Args, Debug)]
pub struct WatchCmd {
    /// Stop after this many ticks (runs until Ctrl-C when omitted)
    #[arg(long, short = 'n')]
    pub ticks: Option<u64>,
}

/// Show or persist the resolved configuration
#[derive(Args, Debug)]
pub struct ConfigCmd {
    /// Write the resolved configuration to the config file
    #[arg(long)]
    pub save: bool,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Standard JSON output wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// One row of the category listing
#[derive(Debug, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub channels: usize,
    pub default: bool,
}

/// Result of toggling a star
#[derive(Debug, Serialize, Deserialize)]
pub struct StarResponse {
    pub id: String,
    pub starred: bool,
    pub starred_ids: Vec<String>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print data as a JSON envelope, or as the given human-readable lines
    pub fn print<T: Serialize>(&self, data: T, human: impl FnOnce() -> Vec<String>) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for line in human() {
                println!("{}", line);
            }
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["tvguide"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::NotFound), 4);
    }

    #[test]
    fn test_log_level() {
        let cli = Cli::parse_from(["tvguide", "starred"]);
        assert_eq!(cli.log_level(), "warn");
        let cli = Cli::parse_from(["tvguide", "-vv", "starred"]);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_error_envelope() {
        let output = JsonOutput::<()>::error_msg("boom", ExitCode::NotFound);
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value, serde_json::json!({"error": "boom", "exit_code": 4}));
    }
}
