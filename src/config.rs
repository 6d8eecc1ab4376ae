//! Service configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! describe the production site; a `config.toml` in the config directory
//! overrides any subset of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! base_path = "/api"
//!
//! [store]
//! api_base = "https://api.cloudinary.com/v1_1"
//! timeout_ms = 10000        # Per-fetch deadline; a timed-out fetch degrades to empty
//! connect_timeout_ms = 5000
//! # max_concurrent_fetches = 4   # Bound folder fan-out (omit = all at once)
//!
//! [gallery]
//! default_limit = 20
//! max_results = 500         # Per-folder cap (the store's own hard cap is 500)
//!
//! [[gallery.folders]]
//! path = "sai-photo/album/house-work"
//! category = "filter-app"
//!
//! [bootstrap]
//! hero_folder = "sai-photo/hero"
//! hero_max = 10
//!
//! [profiles.hero]
//! widths = [640, 1024, 1600, 2400]
//! sizes = "100vw"
//!
//! [testimonials]
//! source = "file"
//! path = "content/testimonials.json"
//!
//! [logging]
//! format = "text"           # or "json"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want. Tables merge
//! key by key; arrays (such as `gallery.folders`) replace the stock array
//! wholesale. Unknown keys are rejected to catch typos early.
//!
//! ## Credentials
//!
//! Remote store credentials never live in `config.toml`. They are read from
//! `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY` and `CLOUDINARY_API_SECRET`
//! by [`Credentials::from_env`].

use crate::types::FolderSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// The remote store never returns more than this many resources per call.
pub const STORE_MAX_RESULTS: u32 = 500;

pub const ENV_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
pub const ENV_API_KEY: &str = "CLOUDINARY_API_KEY";
pub const ENV_API_SECRET: &str = "CLOUDINARY_API_SECRET";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),
}

/// Service configuration loaded from `config.toml`.
///
/// All fields have defaults matching the production site. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Remote media store connection settings.
    pub store: StoreConfig,
    /// Portfolio gallery folders and paging defaults.
    pub gallery: GalleryConfig,
    /// Folders feeding the landing-page bootstrap payload.
    pub bootstrap: BootstrapConfig,
    /// Per-group URL transformation profiles.
    pub profiles: ProfilesConfig,
    /// Where testimonials come from.
    pub testimonials: TestimonialsConfig,
    /// Cache-Control values for the bootstrap endpoint.
    pub cache: CacheConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.base_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "server.base_path must start with '/'".into(),
            ));
        }
        if self.store.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "store.timeout_ms must be non-zero".into(),
            ));
        }
        if self.store.max_concurrent_fetches == Some(0) {
            return Err(ConfigError::Validation(
                "store.max_concurrent_fetches must be non-zero".into(),
            ));
        }
        if self.gallery.default_limit == 0 {
            return Err(ConfigError::Validation(
                "gallery.default_limit must be non-zero".into(),
            ));
        }
        check_max_results("gallery.max_results", self.gallery.max_results)?;
        check_max_results("bootstrap.hero_max", self.bootstrap.hero_max)?;
        check_max_results(
            "bootstrap.client_photos_max",
            self.bootstrap.client_photos_max,
        )?;
        for (i, folder) in self.gallery.folders.iter().enumerate() {
            if folder.path.trim().is_empty() || folder.category.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "gallery.folders[{i}] needs a non-empty path and category"
                )));
            }
        }
        for (name, profile) in [
            ("hero", &self.profiles.hero),
            ("reach_out", &self.profiles.reach_out),
            ("stats", &self.profiles.stats),
        ] {
            if profile.widths.is_empty() || profile.widths.contains(&0) {
                return Err(ConfigError::Validation(format!(
                    "profiles.{name}.widths must be non-empty and non-zero"
                )));
            }
            check_quality(&format!("profiles.{name}.quality"), profile.quality)?;
        }
        if self.profiles.client_photo.width == 0 {
            return Err(ConfigError::Validation(
                "profiles.client_photo.width must be non-zero".into(),
            ));
        }
        check_quality(
            "profiles.client_photo.quality",
            self.profiles.client_photo.quality,
        )?;
        check_quality("profiles.delivery.quality", self.profiles.delivery.quality)?;
        if self.testimonials.source == TestimonialSourceKind::Http
            && self.testimonials.url.as_deref().unwrap_or("").is_empty()
        {
            return Err(ConfigError::Validation(
                "testimonials.url is required when source = \"http\"".into(),
            ));
        }
        Ok(())
    }
}

fn check_max_results(key: &str, value: u32) -> Result<(), ConfigError> {
    if value == 0 || value > STORE_MAX_RESULTS {
        return Err(ConfigError::Validation(format!(
            "{key} must be 1-{STORE_MAX_RESULTS}"
        )));
    }
    Ok(())
}

fn check_quality(key: &str, value: Option<u32>) -> Result<(), ConfigError> {
    match value {
        Some(q) if q == 0 || q > 100 => {
            Err(ConfigError::Validation(format!("{key} must be 1-100")))
        }
        _ => Ok(()),
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// Path prefix all endpoints are mounted under.
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            base_path: "/api".to_string(),
        }
    }
}

/// Remote media store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Admin API base URL; the cloud name is appended as the next segment.
    pub api_base: String,
    /// Deadline for one folder listing, in milliseconds.
    pub timeout_ms: u64,
    /// TCP connect deadline, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Maximum folder listings in flight per request. `None` = all at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_fetches: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            max_concurrent_fetches: None,
        }
    }
}

/// Portfolio gallery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Page size when the request carries no usable `limit`.
    pub default_limit: usize,
    /// Per-folder listing cap.
    pub max_results: u32,
    /// Folders in display order.
    pub folders: Vec<FolderSpec>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_results: STORE_MAX_RESULTS,
            folders: vec![
                FolderSpec::new("sai-photo/album/house-work", "filter-app"),
                FolderSpec::new("sai-photo/album/customized-work", "filter-product"),
                FolderSpec::new("sai-photo/album/construction-work", "filter-branding"),
                FolderSpec::new("sai-photo/album/hotel-apartments", "filter-books"),
                FolderSpec::new("sai-photo/album/mansion-builders", "filter-mansion"),
            ],
        }
    }
}

/// Folders feeding the landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    pub hero_folder: String,
    pub hero_max: u32,
    pub reach_out_folder: String,
    pub stats_folder: String,
    /// Folder behind the standalone `/reach-out-bg` endpoint.
    pub reach_out_bg_folder: String,
    /// Folder behind the standalone `/stats-clients` endpoint.
    pub stats_clients_folder: String,
    pub client_photos_folder: String,
    pub client_photos_max: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            hero_folder: "sai-photo/hero".to_string(),
            hero_max: 10,
            reach_out_folder: "sai-photo/contact".to_string(),
            stats_folder: "sai-photo/clients".to_string(),
            reach_out_bg_folder: "sai-photo/reach-out".to_string(),
            stats_clients_folder: "sai-photo/Client Estimation".to_string(),
            client_photos_folder: "sai-photo/testimonials/clients".to_string(),
            client_photos_max: 20,
        }
    }
}

/// Width ladder, quality and layout hint for one image group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponsiveProfile {
    /// Target widths, emitted in this order in the srcset.
    pub widths: Vec<u32>,
    /// Fixed quality 1-100. Omit for automatic quality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    /// `sizes` attribute hint for the presentation layer.
    pub sizes: String,
}

/// A single fixed width, no srcset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThumbnailProfile {
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
}

/// Plain listing URL: format negotiation, quality, optional width cap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
}

/// Per-group transformation profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilesConfig {
    /// Gallery items and the standalone listing endpoints.
    pub delivery: DeliveryProfile,
    /// Full-bleed hero slider.
    pub hero: ResponsiveProfile,
    /// Contact section background.
    pub reach_out: ResponsiveProfile,
    /// Stats section background.
    pub stats: ResponsiveProfile,
    /// Testimonial avatars.
    pub client_photo: ThumbnailProfile,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryProfile::default(),
            hero: ResponsiveProfile {
                widths: vec![640, 1024, 1600, 2400],
                quality: None,
                sizes: "100vw".to_string(),
            },
            reach_out: ResponsiveProfile {
                widths: vec![480, 800, 1200],
                quality: Some(70),
                sizes: "(max-width: 768px) 100vw, 50vw".to_string(),
            },
            stats: ResponsiveProfile {
                widths: vec![400, 700, 1000],
                quality: Some(70),
                sizes: "(max-width: 768px) 100vw, 40vw".to_string(),
            },
            client_photo: ThumbnailProfile {
                width: 160,
                quality: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestimonialSourceKind {
    /// Read a JSON document from disk.
    #[default]
    File,
    /// GET a JSON document over HTTP.
    Http,
}

/// Testimonial source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestimonialsConfig {
    pub source: TestimonialSourceKind,
    /// Document path for `source = "file"`, relative to the working directory.
    pub path: String,
    /// Document URL for `source = "http"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for TestimonialsConfig {
    fn default() -> Self {
        Self {
            source: TestimonialSourceKind::File,
            path: "content/testimonials.json".to_string(),
            url: None,
        }
    }
}

/// Cache-Control header values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Bootstrap responses that composed normally.
    pub bootstrap: String,
    /// Bootstrap responses carrying an `error` marker.
    pub degraded: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bootstrap: "public, max-age=120, s-maxage=300, stale-while-revalidate=86400"
                .to_string(),
            degraded: "public, max-age=30, s-maxage=60".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Log output settings. The level filter comes from `RUST_LOG`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

/// Remote store account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Read all three credentials from the environment. Empty values count
    /// as missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };
        Ok(Self {
            cloud_name: get(ENV_CLOUD_NAME)?,
            api_key: get(ENV_API_KEY)?,
            api_secret: get(ENV_API_SECRET)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ServiceConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ServiceConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<ServiceConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Feed Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Tables merge key by key over these defaults; arrays such as
# [[gallery.folders]] replace the default list entirely.
# Unknown keys will cause an error.
#
# Credentials are read from the environment, never from this file:
#   CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
bind = "127.0.0.1:3000"
# Every endpoint is mounted under this prefix (/api/gallery, /api/bootstrap, ...).
base_path = "/api"

# ---------------------------------------------------------------------------
# Remote media store
# ---------------------------------------------------------------------------
[store]
api_base = "https://api.cloudinary.com/v1_1"
# Deadline for a single folder listing. A listing that times out counts as
# failed and contributes nothing; the rest of the response is unaffected.
timeout_ms = 10000
connect_timeout_ms = 5000
# Maximum folder listings in flight per request. Omit to fetch all at once.
# max_concurrent_fetches = 4

# ---------------------------------------------------------------------------
# Portfolio gallery
# ---------------------------------------------------------------------------
[gallery]
# Page size when a request has no usable ?limit=.
default_limit = 20
# Per-folder listing cap (the store never returns more than 500).
max_results = 500

# Folders in display order. `category` is the filter tag the page uses;
# several folders may share one. `title` overrides the display name derived
# from the last path segment (house-work -> "House Work").
[[gallery.folders]]
path = "sai-photo/album/house-work"
category = "filter-app"

[[gallery.folders]]
path = "sai-photo/album/customized-work"
category = "filter-product"

[[gallery.folders]]
path = "sai-photo/album/construction-work"
category = "filter-branding"

[[gallery.folders]]
path = "sai-photo/album/hotel-apartments"
category = "filter-books"

[[gallery.folders]]
path = "sai-photo/album/mansion-builders"
category = "filter-mansion"

# ---------------------------------------------------------------------------
# Landing page bootstrap
# ---------------------------------------------------------------------------
[bootstrap]
hero_folder = "sai-photo/hero"
hero_max = 10
reach_out_folder = "sai-photo/contact"
stats_folder = "sai-photo/clients"
# The standalone /reach-out-bg and /stats-clients endpoints read their own
# folders.
reach_out_bg_folder = "sai-photo/reach-out"
stats_clients_folder = "sai-photo/Client Estimation"
client_photos_folder = "sai-photo/testimonials/clients"
client_photos_max = 20

# ---------------------------------------------------------------------------
# URL transformation profiles
# ---------------------------------------------------------------------------
# quality: 1-100, omit for automatic quality.

# Gallery items and the standalone listing endpoints.
[profiles.delivery]
# width = 1600

[profiles.hero]
widths = [640, 1024, 1600, 2400]
sizes = "100vw"

[profiles.reach_out]
widths = [480, 800, 1200]
quality = 70
sizes = "(max-width: 768px) 100vw, 50vw"

[profiles.stats]
widths = [400, 700, 1000]
quality = 70
sizes = "(max-width: 768px) 100vw, 40vw"

# Testimonial avatars: one small width, no srcset.
[profiles.client_photo]
width = 160

# ---------------------------------------------------------------------------
# Testimonials
# ---------------------------------------------------------------------------
[testimonials]
# "file" reads `path`; "http" fetches `url`.
source = "file"
path = "content/testimonials.json"
# url = "https://example.com/api/testimonials"

# ---------------------------------------------------------------------------
# Cache-Control for /bootstrap
# ---------------------------------------------------------------------------
[cache]
bootstrap = "public, max-age=120, s-maxage=300, stale-while-revalidate=86400"
degraded = "public, max-age=30, s-maxage=60"

# ---------------------------------------------------------------------------
# Logging (level comes from RUST_LOG, default "info")
# ---------------------------------------------------------------------------
[logging]
format = "text"
"##
}
