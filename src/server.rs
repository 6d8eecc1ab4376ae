//! HTTP surface.
//!
//! All routes are mounted under `server.base_path` (default `/api`) and answer
//! with JSON. Upstream failures never surface as 5xx: every endpoint degrades
//! to its normal 200 shape with empty data and an `error` field, so the
//! front-end can always render something.
//!
//! | Route            | Body                                             |
//! |------------------|--------------------------------------------------|
//! | `/gallery`       | one [`GalleryPage`](crate::query::GalleryPage)   |
//! | `/hero`          | `{images: [{src, public_id, width, height}], total}` |
//! | `/client-photos` | `{images: [{src, public_id}], total}`            |
//! | `/reach-out-bg`  | `{image: {src} \| null}`                         |
//! | `/stats-clients` | `{image: {src} \| null}`                         |
//! | `/testimonials`  | `{testimonials, total}`                          |
//! | `/bootstrap`     | one [`BootstrapPayload`](crate::types::BootstrapPayload) |
//! | `/healthz`       | `{status, version}`                              |
//!
//! Every response carries `Access-Control-Allow-Origin: *` and a strong
//! `ETag` (SHA-256 of the body); a matching `If-None-Match` gets `304`.

use crate::bootstrap::Composer;
use crate::config::ServiceConfig;
use crate::fetch::Fetcher;
use crate::query::{GalleryQuery, run_query};
use crate::testimonials::{self, TestimonialSource};
use crate::transform;
use crate::types::{HeroImage, ImageRef, SpotImage, Testimonial};
use axum::Router;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use axum::middleware::{Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("invalid bind address {addr}: {source}")]
    Bind {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared, immutable per-process state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub fetcher: Fetcher,
    pub testimonials: Arc<dyn TestimonialSource>,
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/gallery", get(gallery_handler))
        .route("/hero", get(hero_handler))
        .route("/client-photos", get(client_photos_handler))
        .route("/reach-out-bg", get(reach_out_handler))
        .route("/stats-clients", get(stats_handler))
        .route("/testimonials", get(testimonials_handler))
        .route("/bootstrap", get(bootstrap_handler))
        .route("/healthz", get(healthz_handler));
    let base = state.config.server.base_path.trim_end_matches('/');
    let app = if base.is_empty() {
        api
    } else {
        Router::new().nest(base, api)
    };
    app.layer(from_fn(cors_middleware)).with_state(state)
}

/// Bind `server.bind` and serve until Ctrl-C.
pub async fn serve(state: AppState) -> Result<(), ServeError> {
    let bind = state.config.server.bind.clone();
    let addr: SocketAddr = bind.parse().map_err(|source| ServeError::Bind {
        addr: bind.clone(),
        source,
    })?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr()?,
        base_path = %state.config.server.base_path,
        "gallery-feed listening"
    );
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
    }
}

// =========================================================================
// Middleware
// =========================================================================

async fn cors_middleware(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        put_cors_headers(resp.headers_mut());
        return resp;
    }
    let mut resp = next.run(req).await;
    put_cors_headers(resp.headers_mut());
    resp
}

fn put_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}

// =========================================================================
// Responses
// =========================================================================

/// Strong ETag for a response body.
pub fn etag_for(body: &[u8]) -> String {
    format!("\"{:x}\"", Sha256::digest(body))
}

fn if_none_match_hits(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.split(',')
                .map(str::trim)
                .any(|candidate| candidate == etag || candidate == "*")
        })
}

fn json_response<T: Serialize>(
    request_headers: &HeaderMap,
    value: &T,
    cache_control: Option<&str>,
) -> Response {
    let body = match serde_json::to_vec(value) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "response serialization failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let etag = etag_for(&body);
    let mut resp = if if_none_match_hits(request_headers, &etag) {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        let mut resp = (StatusCode::OK, body).into_response();
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        resp
    };
    let headers = resp.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, v);
    }
    if let Some(cc) = cache_control.and_then(|cc| HeaderValue::from_str(cc).ok()) {
        headers.insert(header::CACHE_CONTROL, cc);
    }
    resp
}

#[derive(Serialize)]
struct ImageList<T> {
    images: Vec<T>,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ImageList<T> {
    fn ok(images: Vec<T>) -> Self {
        Self {
            total: images.len(),
            images,
            error: None,
        }
    }

    fn failed(error: &str) -> Self {
        Self {
            images: Vec::new(),
            total: 0,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Serialize)]
struct Spot {
    image: Option<SpotImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct TestimonialList {
    testimonials: Vec<Testimonial>,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

// =========================================================================
// Handlers
// =========================================================================

async fn gallery_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let cfg = &state.config;
    let query = GalleryQuery::from_params(&params, cfg.gallery.default_limit);
    let (page, reports) =
        run_query(&state.fetcher, &cfg.gallery, &cfg.profiles.delivery, &query).await;
    let page = page.unless_total_failure(&query, &reports);
    json_response(&headers, &page, None)
}

async fn hero_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cfg = &state.config;
    let body = match state
        .fetcher
        .fetch(&cfg.bootstrap.hero_folder, cfg.bootstrap.hero_max)
        .await
    {
        Ok(resources) => ImageList::ok(
            resources
                .into_iter()
                .map(|r| HeroImage {
                    src: transform::delivery(&r.url, &cfg.profiles.delivery),
                    public_id: r.public_id,
                    width: r.width,
                    height: r.height,
                })
                .collect(),
        ),
        Err(e) => {
            warn!(error = %e, "hero fetch failed");
            ImageList::failed("Failed to fetch hero images")
        }
    };
    json_response(&headers, &body, None)
}

async fn client_photos_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cfg = &state.config;
    let body = match state
        .fetcher
        .fetch(
            &cfg.bootstrap.client_photos_folder,
            cfg.bootstrap.client_photos_max,
        )
        .await
    {
        Ok(resources) => ImageList::ok(
            resources
                .into_iter()
                .map(|r| ImageRef {
                    src: transform::delivery(&r.url, &cfg.profiles.delivery),
                    public_id: r.public_id,
                })
                .collect(),
        ),
        Err(e) => {
            warn!(error = %e, "client photos fetch failed");
            ImageList::failed("Failed to fetch client photos")
        }
    };
    json_response(&headers, &body, None)
}

async fn reach_out_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let body = spot(
        &state,
        &state.config.bootstrap.reach_out_bg_folder,
        "Failed to fetch reach-out background",
    )
    .await;
    json_response(&headers, &body, None)
}

async fn stats_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let body = spot(
        &state,
        &state.config.bootstrap.stats_clients_folder,
        "Failed to fetch stats background",
    )
    .await;
    json_response(&headers, &body, None)
}

/// First image of a folder, or `null`.
async fn spot(state: &AppState, folder: &str, failure: &str) -> Spot {
    match state.fetcher.fetch(folder, 1).await {
        Ok(resources) => Spot {
            image: resources.first().map(|r| SpotImage {
                src: transform::delivery(&r.url, &state.config.profiles.delivery),
            }),
            error: None,
        },
        Err(e) => {
            warn!(folder, error = %e, "background fetch failed");
            Spot {
                image: None,
                error: Some(failure.to_string()),
            }
        }
    }
}

async fn testimonials_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let loaded =
        testimonials::load_within(state.testimonials.as_ref(), state.fetcher.timeout()).await;
    let body = match loaded {
        Ok(testimonials) => TestimonialList {
            total: testimonials.len(),
            testimonials,
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "testimonials load failed");
            TestimonialList {
                testimonials: Vec::new(),
                total: 0,
                error: Some("Failed to load testimonials".to_string()),
            }
        }
    };
    json_response(&headers, &body, None)
}

async fn bootstrap_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cfg = &state.config;
    let payload = Composer::new(
        &state.fetcher,
        state.testimonials.as_ref(),
        &cfg.bootstrap,
        &cfg.profiles,
    )
    .compose_or_degraded()
    .await;
    let cache_control = if payload.error.is_some() {
        &cfg.cache.degraded
    } else {
        &cfg.cache.bootstrap
    };
    json_response(&headers, &payload, Some(cache_control.as_str()))
}

async fn healthz_handler(headers: HeaderMap) -> Response {
    let body = Health {
        status: "ok",
        version: crate::version_string(),
    };
    json_response(&headers, &body, None)
}
