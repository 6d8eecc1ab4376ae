//! # Gallery Feed
//!
//! A small JSON service that turns folders in a remote media store into
//! page-ready image data for a marketing site. The store is the source of
//! truth: editors upload into folders, and every request reflects the current
//! contents. Nothing is cached or persisted here.
//!
//! # Architecture: Fetch, Aggregate, Shape
//!
//! Every request flows through the same three steps:
//!
//! ```text
//! 1. Fetch      folder prefix  →  Vec<ImageResource>   (remote listing, per folder)
//! 2. Aggregate  many folders   →  Vec<GalleryItem>     (ordered merge, titles, URLs)
//! 3. Shape      items          →  page / payload JSON  (pagination, bootstrap)
//! ```
//!
//! Each step is independently testable: fetching sits behind the
//! [`fetch::MediaStore`] trait, aggregation is a pure merge over listing
//! results, and shaping is plain data manipulation.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | Remote store client, per-call deadline, tagged listing results |
//! | [`transform`] | Delivery URL rewriting and responsive `srcset` derivation |
//! | [`aggregate`] | Concurrent folder fan-out merged in declaration order |
//! | [`query`] | Category pre-filter, pagination, gallery page shape |
//! | [`bootstrap`] | Five-branch landing-page payload with per-branch degradation |
//! | [`testimonials`] | Testimonial document loading from disk or HTTP |
//! | [`server`] | axum routes, CORS, ETags, graceful shutdown |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Shared serialized types |
//! | [`naming`] | Display titles derived from folder paths |
//! | [`output`] | CLI output formatting for one-shot commands |
//!
//! # Design Decisions
//!
//! ## Order Is Declaration Order
//!
//! Folders are listed concurrently, but the merged gallery is always in the
//! order folders are configured, never in completion order. Titles carry a
//! per-folder position ("House Work 3"), so a stable order is part of the
//! output contract.
//!
//! ## Degrade, Don't Fail
//!
//! A landing page with one missing section beats an error page. Listing
//! failures are returned as tagged results by [`fetch`]; each caller decides
//! how to degrade (skip the folder, empty list, `null` image). HTTP endpoints
//! always answer 200 with their usual shape, adding an `error` field when
//! something went wrong.
//!
//! ## URL Transformation, Not Image Processing
//!
//! All resizing and format negotiation is delegated to the store's CDN by
//! rewriting delivery URLs (see [`transform`]). The service never downloads
//! image bytes.

pub mod aggregate;
pub mod bootstrap;
pub mod config;
pub mod fetch;
pub mod naming;
pub mod output;
pub mod query;
pub mod server;
pub mod testimonials;
pub mod transform;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Release version on a tagged build, `dev@<hash>` otherwise.
pub fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        dev_version()
    }
}

fn dev_version() -> &'static str {
    static DEV: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        "dev@unknown"
    } else {
        DEV.get_or_init(|| format!("dev@{hash}")).as_str()
    }
}
