//! Guide endpoint client
//!
//! Fetches the channel catalog and the program guide over HTTP.
//! Only `200 OK` counts as success; any other status is reported back to the
//! caller as `Fetched::Status` so the store can leave its state untouched.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{Catalog, Epg};

/// Fetch error types
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid JSON from {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No channels endpoint configured")]
    NotConfigured,
}

/// Result of a single GET against a guide endpoint
#[derive(Debug)]
pub enum Fetched<T> {
    /// `200 OK` with a decoded body
    Ok(T),
    /// Any other status; the body is ignored
    Status(StatusCode),
}

/// HTTP client for the channels and EPG endpoints
#[derive(Clone)]
pub struct GuideClient {
    channels_url: Option<String>,
    epg_url: Option<String>,
    client: reqwest::Client,
}

impl GuideClient {
    /// Create a client for the given endpoints
    ///
    /// Empty URLs are treated as unconfigured. Cookies set by the endpoints
    /// are kept and sent back on later requests.
    pub fn new(channels_url: Option<String>, epg_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            channels_url: channels_url.filter(|u| !u.is_empty()),
            epg_url: epg_url.filter(|u| !u.is_empty()),
            client,
        }
    }

    pub fn channels_url(&self) -> Option<&str> {
        self.channels_url.as_deref()
    }

    pub fn epg_url(&self) -> Option<&str> {
        self.epg_url.as_deref()
    }

    /// Whether an EPG endpoint is configured
    pub fn has_epg(&self) -> bool {
        self.epg_url.is_some()
    }

    /// Fetch the channel catalog
    pub async fn fetch_catalog(&self) -> Result<Fetched<Catalog>, FetchError> {
        let url = self.channels_url.as_deref().ok_or(FetchError::NotConfigured)?;
        self.get_json(url).await
    }

    /// Fetch the program guide, `None` when no EPG endpoint is configured
    pub async fn fetch_epg(&self) -> Result<Option<Fetched<Epg>>, FetchError> {
        match self.epg_url.as_deref() {
            Some(url) => self.get_json(url).await.map(Some),
            None => Ok(None),
        }
    }

    /// GET a URL and decode a `200 OK` body as JSON
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Fetched<T>, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(Fetched::Status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let parsed = serde_json::from_str(&body).map_err(|source| FetchError::InvalidJson {
            url: url.to_string(),
            source,
        })?;

        Ok(Fetched::Ok(parsed))
    }
}
