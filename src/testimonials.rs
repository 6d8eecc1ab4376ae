//! Testimonial loading from the static content store.
//!
//! Testimonials are a small hand-edited JSON document. Depending on the
//! deployment it is read from disk or fetched over HTTP; both are a
//! [`TestimonialSource`]. The records themselves are opaque and passed through
//! untouched; only the outer shape is checked.
//!
//! Accepted documents:
//!
//! ```text
//! { "testimonials": [ {...}, {...} ] }
//! [ {...}, {...} ]
//! ```
//!
//! Any other shape yields an empty list.

use crate::config::{TestimonialSourceKind, TestimonialsConfig};
use crate::types::Testimonial;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestimonialError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Http(String),
    #[error("testimonial source returned status {0}")]
    Status(u16),
    #[error("testimonials unavailable: {0}")]
    Unavailable(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can produce the testimonial sequence.
#[async_trait]
pub trait TestimonialSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Testimonial>, TestimonialError>;
}

/// [`TestimonialSource::load`] bounded by `deadline`.
pub async fn load_within(
    source: &dyn TestimonialSource,
    deadline: Duration,
) -> Result<Vec<Testimonial>, TestimonialError> {
    match tokio::time::timeout(deadline, source.load()).await {
        Ok(result) => result,
        Err(_) => Err(TestimonialError::Timeout(deadline)),
    }
}

/// Extract the testimonial sequence from a parsed document.
pub fn normalize_testimonials(doc: Value) -> Vec<Testimonial> {
    match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("testimonials") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// JSON document on local disk.
pub struct FileTestimonials {
    path: PathBuf,
}

impl FileTestimonials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TestimonialSource for FileTestimonials {
    async fn load(&self) -> Result<Vec<Testimonial>, TestimonialError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let doc: Value = serde_json::from_slice(&bytes)?;
        Ok(normalize_testimonials(doc))
    }
}

/// JSON document behind a URL.
pub struct HttpTestimonials {
    client: reqwest::Client,
    url: String,
}

impl HttpTestimonials {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TestimonialSource for HttpTestimonials {
    async fn load(&self) -> Result<Vec<Testimonial>, TestimonialError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TestimonialError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(TestimonialError::Status(resp.status().as_u16()));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TestimonialError::Http(e.to_string()))?;
        let doc: Value = serde_json::from_slice(&bytes)?;
        Ok(normalize_testimonials(doc))
    }
}

/// Build the configured source. Validation guarantees `url` is set for
/// `source = "http"`.
pub fn from_config(
    config: &TestimonialsConfig,
    client: reqwest::Client,
) -> Arc<dyn TestimonialSource> {
    match config.source {
        TestimonialSourceKind::File => Arc::new(FileTestimonials::new(&config.path)),
        TestimonialSourceKind::Http => Arc::new(HttpTestimonials::new(
            client,
            config.url.clone().unwrap_or_default(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::spawn_stub_server;
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn normalize_wrapped_document() {
        let doc = json!({ "testimonials": [{ "name": "A" }, { "name": "B" }] });
        let items = normalize_testimonials(doc);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "A");
    }

    #[test]
    fn normalize_bare_array() {
        let items = normalize_testimonials(json!([1, "two", { "three": 3 }]));
        assert_eq!(items, vec![json!(1), json!("two"), json!({ "three": 3 })]);
    }

    #[test]
    fn normalize_malformed_shapes_are_empty() {
        assert!(normalize_testimonials(json!({ "testimonials": "nope" })).is_empty());
        assert!(normalize_testimonials(json!({ "other": [] })).is_empty());
        assert!(normalize_testimonials(json!(42)).is_empty());
        assert!(normalize_testimonials(Value::Null).is_empty());
    }

    #[tokio::test]
    async fn file_source_reads_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("testimonials.json");
        std::fs::write(&path, r#"{"testimonials":[{"quote":"Great work"}]}"#).unwrap();
        let items = FileTestimonials::new(&path).load().await.unwrap();
        assert_eq!(items, vec![json!({ "quote": "Great work" })]);
    }

    #[tokio::test]
    async fn file_source_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = FileTestimonials::new(tmp.path().join("missing.json"))
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, TestimonialError::Io(_)));
    }

    #[tokio::test]
    async fn file_source_invalid_json_is_json_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("testimonials.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = FileTestimonials::new(&path).load().await.unwrap_err();
        assert!(matches!(err, TestimonialError::Json(_)));
    }

    #[tokio::test]
    async fn http_source_fetches_document() {
        let router = axum::Router::new().route(
            "/api/testimonials",
            get(|| async { axum::Json(json!({ "testimonials": [{ "name": "C" }] })) }),
        );
        let base = spawn_stub_server(router).await;
        let source = HttpTestimonials::new(
            reqwest::Client::new(),
            format!("{base}/api/testimonials"),
        );
        let items = source.load().await.unwrap();
        assert_eq!(items, vec![json!({ "name": "C" })]);
    }

    #[tokio::test]
    async fn http_source_non_success_is_status_error() {
        let router = axum::Router::new().route(
            "/t",
            get(|| async { (StatusCode::NOT_FOUND, "missing") }),
        );
        let base = spawn_stub_server(router).await;
        let source = HttpTestimonials::new(reqwest::Client::new(), format!("{base}/t"));
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, TestimonialError::Status(404)));
    }

    #[tokio::test]
    async fn hanging_http_source_times_out() {
        let router = axum::Router::new().route(
            "/t",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                axum::Json(json!([]))
            }),
        );
        let base = spawn_stub_server(router).await;
        let source = HttpTestimonials::new(reqwest::Client::new(), format!("{base}/t"));
        let started = std::time::Instant::now();
        let err = load_within(&source, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, TestimonialError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn load_within_passes_prompt_results_through() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("testimonials.json");
        std::fs::write(&path, r#"[{"name":"D"}]"#).unwrap();
        let items = load_within(&FileTestimonials::new(&path), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(items, vec![json!({ "name": "D" })]);
    }
}
