//! CLI Command Handlers
//!
//! Each handler takes the store, CLI args and Output, returns ExitCode.
//! Handlers only read derived views; the store is bootstrapped by
//! [`open_store`] and [`load_catalog`] before they run.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::api::GuideClient;
use crate::cli::{
    CategorySummary, ChannelCmd, ChannelsCmd, Cli, Command, ConfigCmd, ExitCode, Output, StarCmd,
    StarResponse, WatchCmd,
};
use crate::config::Config;
use crate::models::Channel;
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use crate::store::{ChannelStore, FetchOutcome};
use crate::views;

// =============================================================================
// Store Setup
// =============================================================================

/// Resolve configuration: file, then environment, then CLI flags
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    config.apply_env();
    config.apply_overrides(cli.channels_url.clone(), cli.epg_url.clone());
    if let Some(path) = &cli.storage {
        config.storage_path = Some(path.clone());
    }
    Ok(config)
}

/// Build the store from configuration
pub fn open_store(config: &Config) -> ChannelStore {
    let storage: Arc<dyn KeyValueStorage> = match config.storage_path() {
        Some(path) => Arc::new(FileStorage::new(path)),
        None => {
            tracing::warn!("No data directory available, starred channels will not persist");
            Arc::new(MemoryStorage::new())
        }
    };

    let client = GuideClient::new(config.channels_url.clone(), config.epg_url.clone());
    ChannelStore::new(client, storage)
}

/// Run the startup fetches; returns an exit code if the catalog is unusable
pub async fn load_catalog(store: &ChannelStore, output: &Output) -> Option<ExitCode> {
    if store.client().channels_url().is_none() {
        return Some(output.error(
            "No channels endpoint configured (set channels_url, TVGUIDE_CHANNELS_URL or --channels-url)",
            ExitCode::InvalidArgs,
        ));
    }

    output.info("Fetching channel catalog...");
    let report = store.bootstrap().await;

    match report.channels {
        Ok(FetchOutcome::Committed) => None,
        Ok(FetchOutcome::Rejected(status)) => Some(output.error(
            format!("Channel endpoint returned HTTP {}", status),
            ExitCode::NetworkError,
        )),
        Ok(FetchOutcome::Skipped) => None,
        Err(e) => Some(output.error(
            format!("Channel fetch failed: {}", e),
            ExitCode::NetworkError,
        )),
    }
}

fn print_or_fail<T: Serialize>(
    output: &Output,
    data: T,
    human: impl FnOnce() -> Vec<String>,
) -> ExitCode {
    if let Err(e) = output.print(data, human) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

fn channel_lines(channels: &[Channel]) -> Vec<String> {
    channels.iter().map(|ch| format!("  {}", ch)).collect()
}

// =============================================================================
// Categories Command
// =============================================================================

pub async fn categories_cmd(store: &ChannelStore, output: &Output) -> ExitCode {
    let summaries: Vec<CategorySummary> = store
        .read(|state| {
            let default = views::default_category(state);
            state
                .channels
                .categories
                .iter()
                .map(|c| CategorySummary {
                    name: c.name.clone(),
                    channels: c.channels.len(),
                    default: default.is_some_and(|d| std::ptr::eq(d, c)),
                })
                .collect()
        })
        .await;

    let lines = summaries
        .iter()
        .map(|s| {
            let marker = if s.default { "*" } else { " " };
            format!("{} {} ({} channels)", marker, s.name, s.channels)
        })
        .collect::<Vec<_>>();

    print_or_fail(output, &summaries, || lines)
}

// =============================================================================
// Channels Command
// =============================================================================

pub async fn channels_cmd(store: &ChannelStore, cmd: ChannelsCmd, output: &Output) -> ExitCode {
    let found = store
        .read(|state| {
            let name = match cmd.category {
                Some(name) => name,
                None => match views::default_category(state) {
                    Some(category) => category.name.clone(),
                    None => return Ok(None),
                },
            };
            if !views::has_category(state, &name) {
                return Err(name);
            }
            let channels = views::channels_in_category(state, &name);
            Ok(Some((name, channels)))
        })
        .await;

    match found {
        Ok(Some((name, channels))) => {
            let mut lines = vec![format!("{}:", name)];
            lines.extend(channel_lines(&channels));
            print_or_fail(output, &channels, || lines)
        }
        Ok(None) => output.error("Catalog has no categories", ExitCode::NotFound),
        Err(name) => output.error(format!("No category named '{}'", name), ExitCode::NotFound),
    }
}

// =============================================================================
// Channel Command
// =============================================================================

/// Single channel with guide data and starred flag
#[derive(Debug, Serialize)]
pub struct ChannelDetail {
    #[serde(flatten)]
    pub channel: Channel,
    pub starred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epg: Option<serde_json::Value>,
}

pub async fn channel_cmd(store: &ChannelStore, cmd: ChannelCmd, output: &Output) -> ExitCode {
    let detail = store
        .read(|state| {
            views::channel_by_id(state, &cmd.id).map(|channel| ChannelDetail {
                starred: views::is_starred(state, &channel.id),
                epg: state.epg.for_channel(&channel.id).cloned(),
                channel,
            })
        })
        .await;

    match detail {
        Some(detail) => {
            let mut lines = vec![detail.channel.to_string()];
            if detail.starred {
                lines.push("  starred".to_string());
            }
            if let Some(epg) = &detail.epg {
                lines.push(format!("  guide: {}", epg));
            }
            print_or_fail(output, &detail, || lines)
        }
        None => output.error(format!("No channel with id '{}'", cmd.id), ExitCode::NotFound),
    }
}

// =============================================================================
// Starred Commands
// =============================================================================

pub async fn starred_cmd(store: &ChannelStore, output: &Output) -> ExitCode {
    let channels = store.read(views::starred_channels).await;
    let lines = if channels.is_empty() {
        vec!["No starred channels".to_string()]
    } else {
        channel_lines(&channels)
    };
    print_or_fail(output, &channels, || lines)
}

pub async fn star_cmd(store: &ChannelStore, cmd: StarCmd, output: &Output) -> ExitCode {
    let starred = match store.toggle_star(&cmd.id).await {
        Ok(starred) => starred,
        Err(e) => return output.error(format!("Failed to save starred channels: {}", e), ExitCode::Error),
    };

    let response = StarResponse {
        starred_ids: store.read(|state| state.starred_ids.clone()).await,
        id: cmd.id,
        starred,
    };
    let line = format!(
        "{} {}",
        if starred { "Starred" } else { "Unstarred" },
        response.id
    );
    print_or_fail(output, &response, || vec![line])
}

// =============================================================================
// Watch Command
// =============================================================================

#[derive(Debug, Serialize)]
struct Tick {
    now: chrono::DateTime<chrono::Utc>,
}

pub async fn watch_cmd(
    store: &ChannelStore,
    cmd: WatchCmd,
    config: &Config,
    output: &Output,
) -> ExitCode {
    let period = config.clock_period();
    let clock = store.spawn_clock(period);
    let mut ticker = tokio::time::interval(period);
    let mut ticks = 0u64;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let code = loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = store.read(|state| state.now).await;
                let line = now.format("%Y-%m-%d %H:%M:%S UTC").to_string();
                if let Err(e) = output.print(Tick { now }, || vec![line]) {
                    break output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
                ticks += 1;
                if cmd.ticks.is_some_and(|limit| ticks >= limit) {
                    break ExitCode::Success;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted after {} ticks", ticks);
                break ExitCode::Success;
            }
        }
    };

    clock.abort();
    code
}

// =============================================================================
// Config Command
// =============================================================================

pub fn config_cmd(
    config_path: Option<&Path>,
    cmd: ConfigCmd,
    config: &Config,
    output: &Output,
) -> ExitCode {
    if cmd.save {
        let saved = match config_path {
            Some(path) => config.save_to(path),
            None => config.save(),
        };
        if let Err(e) = saved {
            return output.error(format!("Failed to save config: {:#}", e), ExitCode::Error);
        }
        output.info("Config saved");
    }

    let lines = vec![
        format!(
            "channels_url = {}",
            config.channels_url.as_deref().unwrap_or("(unset)")
        ),
        format!("epg_url = {}", config.epg_url.as_deref().unwrap_or("(unset)")),
        format!(
            "storage_path = {}",
            config
                .storage_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(memory)".to_string())
        ),
        format!("clock_interval_secs = {}", config.clock_period().as_secs()),
    ];
    print_or_fail(output, config, || lines)
}

// =============================================================================
// Entry
// =============================================================================

/// Resolve config, build the store, bootstrap if needed and run the command
pub async fn run(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config = match resolve_config(&cli).context("Failed to load configuration") {
        Ok(config) => config,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };

    let store = open_store(&config);

    if cli.command.needs_fetch() {
        if let Some(code) = load_catalog(&store, &output).await {
            return code;
        }
    }

    let config_path = cli.config.clone();
    match cli.command {
        Command::Categories => categories_cmd(&store, &output).await,
        Command::Channels(cmd) => channels_cmd(&store, cmd, &output).await,
        Command::Channel(cmd) => channel_cmd(&store, cmd, &output).await,
        Command::Starred => starred_cmd(&store, &output).await,
        Command::Star(cmd) => star_cmd(&store, cmd, &output).await,
        Command::Watch(cmd) => watch_cmd(&store, cmd, &config, &output).await,
        Command::Config(cmd) => config_cmd(config_path.as_deref(), cmd, &config, &output),
    }
}
