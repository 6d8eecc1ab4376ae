//! Remote media store access.
//!
//! The [`MediaStore`] trait is the single seam to the image-hosting service:
//! list the resources under a folder prefix. [`CloudinaryStore`] is the
//! production implementation; tests swap in an in-memory store.
//!
//! [`Fetcher`] wraps a store with the per-fetch deadline and the result cap.
//! Its [`Fetcher::fetch`] returns a tagged result so callers can tell a
//! legitimately empty folder (`Ok(vec![])`) from a failed listing (`Err`), and
//! decide the degrade policy themselves.
//!
//! ## Wire format
//!
//! ```text
//! GET {api_base}/{cloud_name}/resources/image?prefix=<folder>&max_results=<n>&type=upload
//! Authorization: Basic base64(api_key:api_secret)
//!
//! { "resources": [ { "public_id": "...", "secure_url": "https://...",
//!                    "width": 1600, "height": 1067, "format": "jpg" }, ... ] }
//! ```

use crate::config::{Credentials, STORE_MAX_RESULTS, StoreConfig};
use crate::types::ImageResource;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("remote store returned status {0}")]
    Status(u16),
    #[error("malformed listing: {0}")]
    Decode(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// A source of image listings keyed by folder prefix.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// All resources whose identifier starts with `prefix`, at most
    /// `max_results` of them, in the store's order.
    async fn list_resources(
        &self,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<ImageResource>, FetchError>;
}

/// Build the shared HTTP client used for the remote store and any HTTP
/// testimonial source.
pub fn build_client(config: &StoreConfig) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .user_agent(concat!("gallery-feed/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::Transport(e.to_string()))
}

/// Admin-API backed store.
pub struct CloudinaryStore {
    client: reqwest::Client,
    api_base: String,
    credentials: Credentials,
}

impl CloudinaryStore {
    pub fn new(client: reqwest::Client, api_base: &str, credentials: Credentials) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/{}/resources/image",
            self.api_base, self.credentials.cloud_name
        )
    }
}

#[derive(Debug, Deserialize)]
struct ResourceListing {
    #[serde(default)]
    resources: Vec<RemoteResource>,
}

#[derive(Debug, Deserialize)]
struct RemoteResource {
    public_id: String,
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    format: Option<String>,
}

impl RemoteResource {
    fn into_resource(self) -> Option<ImageResource> {
        let url = self.secure_url.or(self.url)?;
        Some(ImageResource {
            url,
            public_id: self.public_id,
            width: self.width,
            height: self.height,
            format: self.format,
        })
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    #[instrument(name = "store_list_resources", skip(self))]
    async fn list_resources(
        &self,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<ImageResource>, FetchError> {
        let resp = self
            .client
            .get(self.listing_url())
            .query(&[
                ("prefix", prefix),
                ("max_results", &max_results.to_string()),
                ("type", "upload"),
            ])
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let listing: ResourceListing = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let total = listing.resources.len();
        let resources: Vec<ImageResource> = listing
            .resources
            .into_iter()
            .filter_map(RemoteResource::into_resource)
            .collect();
        if resources.len() < total {
            debug!(
                prefix,
                skipped = total - resources.len(),
                "resources without a delivery url"
            );
        }
        Ok(resources)
    }
}

/// A [`MediaStore`] plus the deadline and fan-out bound applied to each call.
#[derive(Clone)]
pub struct Fetcher {
    store: Arc<dyn MediaStore>,
    timeout: Duration,
    max_in_flight: Option<usize>,
}

impl Fetcher {
    pub fn new(store: Arc<dyn MediaStore>, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            max_in_flight: None,
        }
    }

    pub fn from_config(store: Arc<dyn MediaStore>, config: &StoreConfig) -> Self {
        Self {
            store,
            timeout: Duration::from_millis(config.timeout_ms),
            max_in_flight: config.max_concurrent_fetches,
        }
    }

    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = Some(n.max(1));
        self
    }

    /// Deadline applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upper bound on concurrent listings per aggregation, if any.
    pub fn max_in_flight(&self) -> Option<usize> {
        self.max_in_flight
    }

    /// List a folder. `max_results` is clamped to the store's hard cap and
    /// the result is truncated to it; callers must still treat a full page as
    /// possibly incomplete.
    pub async fn fetch(
        &self,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<ImageResource>, FetchError> {
        let max = max_results.clamp(1, STORE_MAX_RESULTS);
        let mut resources =
            match tokio::time::timeout(self.timeout, self.store.list_resources(prefix, max)).await
            {
                Ok(result) => result?,
                Err(_) => return Err(FetchError::Timeout(self.timeout)),
            };
        resources.truncate(max as usize);
        Ok(resources)
    }

    /// [`fetch`](Self::fetch) for callers with no use for the failure reason:
    /// a failed listing is logged and reads as an empty folder.
    pub async fn fetch_or_empty(&self, prefix: &str, max_results: u32) -> Vec<ImageResource> {
        self.fetch(prefix, max_results).await.unwrap_or_else(|e| {
            warn!(prefix, error = %e, "listing failed, treating folder as empty");
            Vec::new()
        })
    }
}
