//! tvguide - channel catalog and EPG store for a TV guide viewer
//!
//! One store holds the channel listing, the program guide, the user's
//! starred channels and a live clock. Lookups over that data are plain
//! functions of the current state.
//!
//! # Modules
//!
//! - `models` - Catalog, category, channel and EPG types
//! - `api` - HTTP client for the guide endpoints
//! - `storage` - Durable key-value storage for the starred collection
//! - `store` - State, mutators, fetch actions and the clock
//! - `views` - Derived lookups over the state
//! - `config` - Config file and endpoint resolution
//! - `cli` / `commands` - Command line front end

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod storage;
pub mod store;
pub mod views;

// Re-export commonly used types
pub use models::{Catalog, Category, Channel, Epg};

pub use api::{FetchError, GuideClient};
pub use config::Config;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::{BootstrapReport, ChannelStore, FetchOutcome, StoreState};
