//! Delivery URL rewriting and responsive variant derivation.
//!
//! The remote store serves transformed images when directives are injected
//! right after the `/upload/` segment of a canonical URL:
//!
//! ```text
//! https://res.cloudinary.com/demo/image/upload/v17/sai-photo/hero/a.jpg
//! https://res.cloudinary.com/demo/image/upload/f_auto,q_auto,w_800,c_limit/v17/sai-photo/hero/a.jpg
//! ```
//!
//! - `f_auto` lets the CDN negotiate the best format for the requesting browser.
//! - `q_auto` / `q_<n>` selects automatic or fixed quality.
//! - `w_<n>,c_limit` caps the width without upscaling smaller originals.
//!
//! Everything here is a pure string transformation. Only the first `/upload/`
//! occurrence is rewritten; URLs without it are returned unchanged.

use crate::config::{DeliveryProfile, ResponsiveProfile, ThumbnailProfile};
use crate::types::ResponsiveImage;

/// Path segment after which transformation directives are injected.
const UPLOAD_SEGMENT: &str = "/upload/";

/// Encoding quality directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    /// Let the CDN pick (`q_auto`).
    #[default]
    Auto,
    /// Fixed quality 1-100 (`q_<n>`).
    Fixed(u32),
}

impl Quality {
    /// Fixed quality, clamped to 1-100.
    pub fn fixed(value: u32) -> Self {
        Self::Fixed(value.clamp(1, 100))
    }

    /// `None` in config means automatic quality.
    pub fn from_config(value: Option<u32>) -> Self {
        value.map(Self::fixed).unwrap_or_default()
    }

    fn directive(self) -> String {
        match self {
            Self::Auto => "q_auto".to_string(),
            Self::Fixed(n) => format!("q_{n}"),
        }
    }
}

/// Rewrite a canonical URL into a delivery URL with format negotiation,
/// quality and an optional width cap.
pub fn to_delivery(url: &str, width: Option<u32>, quality: Quality) -> String {
    if !url.contains(UPLOAD_SEGMENT) {
        return url.to_string();
    }
    let mut directives = format!("f_auto,{}", quality.directive());
    if let Some(w) = width {
        directives.push_str(&format!(",w_{w},c_limit"));
    }
    url.replacen(UPLOAD_SEGMENT, &format!("{UPLOAD_SEGMENT}{directives}/"), 1)
}

/// Build a `srcset` attribute value: one `"<url> <width>w"` entry per width,
/// in the given order, joined by `", "`.
pub fn to_srcset(url: &str, widths: &[u32], quality: Quality) -> String {
    widths
        .iter()
        .map(|w| format!("{} {}w", to_delivery(url, Some(*w), quality), w))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Full responsive variant set for one image under a size profile.
///
/// The representative `src` uses the middle width of the ladder, so browsers
/// without `srcset` support still get a reasonably sized image.
pub fn responsive(url: &str, profile: &ResponsiveProfile) -> ResponsiveImage {
    let quality = Quality::from_config(profile.quality);
    let representative = profile.widths.get(profile.widths.len() / 2).copied();
    ResponsiveImage {
        src: to_delivery(url, representative, quality),
        srcset: to_srcset(url, &profile.widths, quality),
        sizes: profile.sizes.clone(),
    }
}

/// Single fixed-width URL, no srcset.
pub fn thumbnail(url: &str, profile: &ThumbnailProfile) -> String {
    to_delivery(url, Some(profile.width), Quality::from_config(profile.quality))
}

/// Plain delivery URL under a listing profile.
pub fn delivery(url: &str, profile: &DeliveryProfile) -> String {
    to_delivery(url, profile.width, Quality::from_config(profile.quality))
}
