//! Channel store: state, mutators and fetch actions
//!
//! `StoreState` is the plain data plus its synchronous mutators.
//! `ChannelStore` is the shared handle the rest of the application holds: it
//! owns the state behind a lock, persists the starred collection, and runs
//! the fetch actions and the clock.
//!
//! Derived views live in [`crate::views`] and take a `&StoreState`; use
//! [`ChannelStore::read`] or [`ChannelStore::snapshot`] to get one.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{FetchError, Fetched, GuideClient};
use crate::models::{Catalog, Epg};
use crate::storage::{self, KeyValueStorage, StorageError};

/// Default clock refresh period
pub const CLOCK_PERIOD: Duration = Duration::from_secs(1);

// =============================================================================
// State
// =============================================================================

/// Everything the store holds
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    /// Current time, refreshed by the clock
    pub now: DateTime<Utc>,
    /// Channel catalog, empty until the first successful fetch
    pub channels: Catalog,
    /// Program guide, empty until the first successful fetch
    pub epg: Epg,
    /// Starred channel ids in the order they were starred
    pub starred_ids: Vec<String>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl StoreState {
    /// Fresh state with an already loaded starred collection
    pub fn new(starred_ids: Vec<String>) -> Self {
        Self {
            now: Utc::now(),
            channels: Catalog::default(),
            epg: Epg::default(),
            starred_ids,
        }
    }

    pub fn refresh_clock(&mut self) {
        self.now = Utc::now();
    }

    /// Replace the catalog wholesale
    pub fn set_channels(&mut self, catalog: Catalog) {
        self.channels = catalog;
    }

    /// Replace the guide wholesale
    pub fn set_epg(&mut self, epg: Epg) {
        self.epg = epg;
    }

    /// Remove the first occurrence of `channel_id`, or append it if absent
    ///
    /// Returns whether the channel is starred afterwards.
    pub fn toggle_star(&mut self, channel_id: &str) -> bool {
        match self.starred_ids.iter().position(|id| id == channel_id) {
            Some(idx) => {
                self.starred_ids.remove(idx);
                false
            }
            None => {
                self.starred_ids.push(channel_id.to_string());
                true
            }
        }
    }
}

// =============================================================================
// Fetch Outcome
// =============================================================================

/// What a fetch action did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// `200 OK`; the body replaced the previous value
    Committed,
    /// Any other status; state left unchanged
    Rejected(StatusCode),
    /// No endpoint configured; no request was made
    Skipped,
}

impl FetchOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, FetchOutcome::Committed)
    }
}

/// Results of the startup fetches
#[derive(Debug)]
pub struct BootstrapReport {
    pub channels: Result<FetchOutcome, FetchError>,
    pub epg: Result<FetchOutcome, FetchError>,
}

impl BootstrapReport {
    /// True when the catalog was loaded
    pub fn channels_loaded(&self) -> bool {
        matches!(self.channels, Ok(FetchOutcome::Committed))
    }
}

// =============================================================================
// Store Handle
// =============================================================================

/// Shared handle to the channel store
///
/// Cloning is cheap; every clone sees the same state. A handle is expected to
/// live for the whole session.
#[derive(Clone)]
pub struct ChannelStore {
    state: Arc<RwLock<StoreState>>,
    storage: Arc<dyn KeyValueStorage>,
    client: GuideClient,
}

impl ChannelStore {
    /// Build the store, loading the starred collection from `storage`
    pub fn new(client: GuideClient, storage: Arc<dyn KeyValueStorage>) -> Self {
        let starred = storage::load_starred(storage.as_ref());
        info!("Store created with {} starred channels", starred.len());

        Self {
            state: Arc::new(RwLock::new(StoreState::new(starred))),
            storage,
            client,
        }
    }

    pub fn client(&self) -> &GuideClient {
        &self.client
    }

    /// Run `f` against the current state under the read lock
    pub async fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        let state = self.state.read().await;
        f(&state)
    }

    /// Owned copy of the current state
    pub async fn snapshot(&self) -> StoreState {
        self.state.read().await.clone()
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    pub async fn refresh_clock(&self) {
        self.state.write().await.refresh_clock();
    }

    pub async fn set_channels(&self, catalog: Catalog) {
        debug!("Committing catalog with {} categories", catalog.categories.len());
        self.state.write().await.set_channels(catalog);
    }

    pub async fn set_epg(&self, epg: Epg) {
        self.state.write().await.set_epg(epg);
    }

    /// Toggle a channel in the starred collection and persist the result
    ///
    /// The in-memory change is kept even if persisting fails. Returns whether
    /// the channel is starred afterwards.
    pub async fn toggle_star(&self, channel_id: &str) -> Result<bool, StorageError> {
        // Hold the write lock until the save finishes so concurrent toggles
        // land in order; the file write itself runs on the blocking pool
        let mut state = self.state.write().await;
        let starred = state.toggle_star(channel_id);
        debug!("Channel {} starred={}", channel_id, starred);

        let ids = state.starred_ids.clone();
        let backend = Arc::clone(&self.storage);
        let saved = tokio::task::spawn_blocking(move || {
            storage::save_starred(backend.as_ref(), &ids)
        })
        .await
        .map_err(StorageError::from)
        .and_then(|result| result);
        drop(state);

        if let Err(e) = saved {
            warn!("Failed to persist starred channels: {}", e);
            return Err(e);
        }
        Ok(starred)
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// Fetch the catalog and commit it on `200 OK`
    pub async fn fetch_channels(&self) -> Result<FetchOutcome, FetchError> {
        match self.client.fetch_catalog().await? {
            Fetched::Ok(catalog) => {
                info!("Fetched {} channel categories", catalog.categories.len());
                self.set_channels(catalog).await;
                Ok(FetchOutcome::Committed)
            }
            Fetched::Status(status) => {
                warn!("Failed to get channels: HTTP {}", status);
                Ok(FetchOutcome::Rejected(status))
            }
        }
    }

    /// Fetch the guide and commit it on `200 OK`; skipped without an EPG URL
    pub async fn fetch_epg(&self) -> Result<FetchOutcome, FetchError> {
        match self.client.fetch_epg().await? {
            None => {
                debug!("No EPG endpoint configured, skipping");
                Ok(FetchOutcome::Skipped)
            }
            Some(Fetched::Ok(epg)) => {
                info!("Fetched EPG");
                self.set_epg(epg).await;
                Ok(FetchOutcome::Committed)
            }
            Some(Fetched::Status(status)) => {
                warn!("Failed to get EPG: HTTP {}", status);
                Ok(FetchOutcome::Rejected(status))
            }
        }
    }

    /// Run both startup fetches concurrently and log any failure
    pub async fn bootstrap(&self) -> BootstrapReport {
        let (channels, epg) = tokio::join!(self.fetch_channels(), self.fetch_epg());

        if let Err(e) = &channels {
            error!("Channel fetch failed: {}", e);
        }
        if let Err(e) = &epg {
            error!("EPG fetch failed: {}", e);
        }

        BootstrapReport { channels, epg }
    }

    /// Spawn a task refreshing the clock every `period`
    ///
    /// The task runs until the returned handle is aborted or the runtime
    /// shuts down.
    pub fn spawn_clock(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.refresh_clock().await;
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
