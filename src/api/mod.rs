//! API clients for external services
//!
//! - Guide: channel catalog and EPG endpoints

pub mod guide;

pub use guide::{FetchError, Fetched, GuideClient};
