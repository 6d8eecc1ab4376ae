//! Shared test utilities for the gallery-feed test suite.
//!
//! Provides an in-memory [`MockStore`], resource fixtures, and a helper to
//! serve a stub HTTP router on an ephemeral local port.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let store = MockStore::default()
//!     .with_folder("sai-photo/album/house-work", resources("sai-photo/album/house-work", 2))
//!     .with_failure("sai-photo/album/customized-work", 500);
//! let (fetcher, store) = fetcher_for(store);
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::fetch::{FetchError, Fetcher, MediaStore};
use crate::testimonials::TestimonialSource;
use crate::types::{FolderSpec, ImageResource, Testimonial};

// =========================================================================
// Fixtures
// =========================================================================

/// A canonical upload URL resource named `<folder>/img-<i>`.
pub fn sample_resource(folder: &str, i: usize) -> ImageResource {
    ImageResource {
        url: format!("https://res.cloudinary.com/demo/image/upload/v1/{folder}/img-{i}.jpg"),
        public_id: format!("{folder}/img-{i}"),
        width: Some(1600),
        height: Some(1067),
        format: Some("jpg".to_string()),
    }
}

/// `n` sample resources for a folder.
pub fn resources(folder: &str, n: usize) -> Vec<ImageResource> {
    (0..n).map(|i| sample_resource(folder, i)).collect()
}

/// The two-folder set used by most gallery tests.
pub fn house_and_custom() -> Vec<FolderSpec> {
    vec![
        FolderSpec::new("sai-photo/album/house-work", "filter-app"),
        FolderSpec::new("sai-photo/album/customized-work", "filter-product"),
    ]
}

// =========================================================================
// MockStore
// =========================================================================

enum Listing {
    Ok(Vec<ImageResource>),
    Fail(u16),
}

/// In-memory [`MediaStore`]. Unknown prefixes list as empty.
#[derive(Default)]
pub struct MockStore {
    listings: HashMap<String, Listing>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl MockStore {
    pub fn with_folder(mut self, prefix: &str, resources: Vec<ImageResource>) -> Self {
        self.listings
            .insert(prefix.to_string(), Listing::Ok(resources));
        self
    }

    /// Listing `prefix` fails with the given HTTP status.
    pub fn with_failure(mut self, prefix: &str, status: u16) -> Self {
        self.listings
            .insert(prefix.to_string(), Listing::Fail(status));
        self
    }

    /// Listing `prefix` sleeps first. Used to force out-of-order completion.
    pub fn with_delay(mut self, prefix: &str, delay: Duration) -> Self {
        self.delays.insert(prefix.to_string(), delay);
        self
    }

    /// Prefixes listed so far, in call order.
    pub fn called_prefixes(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// `max_results` values requested for one prefix, in call order.
    pub fn requested_max(&self, prefix: &str) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == prefix)
            .map(|(_, m)| *m)
            .collect()
    }
}

#[async_trait]
impl MediaStore for MockStore {
    async fn list_resources(
        &self,
        prefix: &str,
        max_results: u32,
    ) -> Result<Vec<ImageResource>, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((prefix.to_string(), max_results));
        if let Some(delay) = self.delays.get(prefix) {
            tokio::time::sleep(*delay).await;
        }
        match self.listings.get(prefix) {
            Some(Listing::Ok(resources)) => Ok(resources.clone()),
            Some(Listing::Fail(status)) => Err(FetchError::Status(*status)),
            None => Ok(Vec::new()),
        }
    }
}

/// Wrap a store in a [`Fetcher`] with a generous deadline.
pub fn fetcher_for(store: MockStore) -> (Fetcher, Arc<MockStore>) {
    let store = Arc::new(store);
    (Fetcher::new(store.clone(), Duration::from_secs(5)), store)
}

// =========================================================================
// Testimonials
// =========================================================================

/// Fixed testimonial list, or a failure.
pub struct StaticTestimonials(pub Result<Vec<Testimonial>, String>);

#[async_trait]
impl TestimonialSource for StaticTestimonials {
    async fn load(&self) -> Result<Vec<Testimonial>, crate::testimonials::TestimonialError> {
        self.0
            .clone()
            .map_err(crate::testimonials::TestimonialError::Unavailable)
    }
}

// =========================================================================
// Stub HTTP server
// =========================================================================

/// Serve `router` on `127.0.0.1:0` and return its base URL (`http://host:port`).
pub async fn spawn_stub_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
