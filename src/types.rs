//! Shared types passed between the fetcher, aggregator, composer and HTTP layer.
//!
//! Field names on the serialized types are part of the JSON contract consumed
//! by the site's front-end scripts, which is why some are snake_case
//! (`public_id`) and others camelCase (`folderName`, `heroImages`).

use serde::{Deserialize, Serialize};

/// A single image as reported by the remote media store.
///
/// A transient view of remote state: fetched fresh on every request and never
/// written anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResource {
    /// Canonical delivery URL (the store's `secure_url`).
    pub url: String,
    /// Stable identifier, e.g. `sai-photo/album/house-work/IMG_0412`.
    pub public_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// A remote folder prefix and the gallery category it feeds.
///
/// Declaration order is significant: it is the order folders appear in the
/// aggregated gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderSpec {
    /// Remote prefix, e.g. `sai-photo/album/house-work`.
    pub path: String,
    /// Filter tag used by the presentation layer, e.g. `filter-app`.
    pub category: String,
    /// Display name override. Derived from the trailing path segment when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl FolderSpec {
    pub fn new(path: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            category: category.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// One gallery entry: an [`ImageResource`] joined with its owning folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub src: String,
    pub category: String,
    /// `"<Display Name> <n>"` with `n` the 1-based position within the folder.
    pub title: String,
    pub public_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Trailing path segment of the owning folder.
    #[serde(rename = "folderName")]
    pub folder_name: String,
}

/// A primary URL plus alternate widths and a layout hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsiveImage {
    pub src: String,
    pub srcset: String,
    pub sizes: String,
}

/// Minimal image reference used for client photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub public_id: String,
}

/// Hero listing entry served by the standalone `/hero` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroImage {
    pub src: String,
    pub public_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Single background image (`/reach-out-bg`, `/stats-clients`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotImage {
    pub src: String,
}

/// Testimonials are opaque to the service and passed through unmodified.
pub type Testimonial = serde_json::Value;

/// Everything the landing page needs, assembled in one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapPayload {
    pub hero_images: Vec<ResponsiveImage>,
    pub reach_out_image: Option<ResponsiveImage>,
    pub stats_image: Option<ResponsiveImage>,
    pub client_photos: Vec<ImageRef>,
    pub testimonials: Vec<Testimonial>,
    /// Composition wall-clock time, Unix epoch milliseconds.
    pub fetched_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BootstrapPayload {
    /// The full payload shape with every field empty and `error` set.
    pub fn degraded(fetched_at: i64, error: impl Into<String>) -> Self {
        Self {
            hero_images: Vec::new(),
            reach_out_image: None,
            stats_image: None,
            client_photos: Vec::new(),
            testimonials: Vec::new(),
            fetched_at,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallery_item_serializes_folder_name_in_camel_case() {
        let item = GalleryItem {
            src: "https://x/upload/a.jpg".into(),
            category: "filter-app".into(),
            title: "House Work 1".into(),
            public_id: "a".into(),
            width: Some(10),
            height: None,
            format: None,
            folder_name: "house-work".into(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["folderName"], "house-work");
        assert_eq!(json["public_id"], "a");
        assert!(json.get("height").is_none());
    }

    #[test]
    fn degraded_payload_keeps_full_shape() {
        let payload = BootstrapPayload::degraded(42, "boom");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["heroImages"], serde_json::json!([]));
        assert!(json["reachOutImage"].is_null());
        assert!(json["statsImage"].is_null());
        assert_eq!(json["clientPhotos"], serde_json::json!([]));
        assert_eq!(json["testimonials"], serde_json::json!([]));
        assert_eq!(json["fetchedAt"], 42);
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn successful_payload_omits_error() {
        let mut payload = BootstrapPayload::degraded(1, "x");
        payload.error = None;
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("error").is_none());
    }
}
