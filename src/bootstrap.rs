//! Landing-page bootstrap payload.
//!
//! The landing page needs five independent pieces of data. Rather than five
//! round trips from the browser, [`Composer`] gathers them concurrently in one
//! request:
//!
//! | Branch        | Source                          | Shape                     |
//! |---------------|---------------------------------|---------------------------|
//! | hero          | `bootstrap.hero_folder`         | responsive, up to `hero_max` |
//! | reach-out     | `bootstrap.reach_out_folder`    | first image, responsive   |
//! | stats         | `bootstrap.stats_folder`        | first image, responsive   |
//! | client photos | `bootstrap.client_photos_folder`| thumbnail, no srcset      |
//! | testimonials  | [`TestimonialSource`]           | passed through            |
//!
//! A failed branch degrades on its own (empty list or `null`) and is logged;
//! the other branches are unaffected. [`BootstrapError`] is reserved for
//! failures that prevent composing anything at all.

use crate::config::{BootstrapConfig, ProfilesConfig, ResponsiveProfile};
use crate::fetch::Fetcher;
use crate::testimonials::{self, TestimonialSource};
use crate::transform;
use crate::types::{BootstrapPayload, ImageRef, ResponsiveImage};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("invalid {group} profile: {reason}")]
    InvalidProfile { group: &'static str, reason: String },
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct Composer<'a> {
    fetcher: &'a Fetcher,
    testimonials: &'a dyn TestimonialSource,
    folders: &'a BootstrapConfig,
    profiles: &'a ProfilesConfig,
}

impl<'a> Composer<'a> {
    pub fn new(
        fetcher: &'a Fetcher,
        testimonials: &'a dyn TestimonialSource,
        folders: &'a BootstrapConfig,
        profiles: &'a ProfilesConfig,
    ) -> Self {
        Self {
            fetcher,
            testimonials,
            folders,
            profiles,
        }
    }

    /// Gather all five branches concurrently.
    pub async fn compose(&self) -> Result<BootstrapPayload, BootstrapError> {
        check_profile("hero", &self.profiles.hero)?;
        check_profile("reach_out", &self.profiles.reach_out)?;
        check_profile("stats", &self.profiles.stats)?;

        let f = self.folders;
        let (hero, reach_out, stats, clients, testimonials) = tokio::join!(
            self.fetcher.fetch(&f.hero_folder, f.hero_max),
            self.fetcher.fetch(&f.reach_out_folder, 1),
            self.fetcher.fetch(&f.stats_folder, 1),
            self.fetcher.fetch(&f.client_photos_folder, f.client_photos_max),
            testimonials::load_within(self.testimonials, self.fetcher.timeout()),
        );

        let hero_images: Vec<ResponsiveImage> = degrade("hero", hero)
            .iter()
            .map(|r| transform::responsive(&r.url, &self.profiles.hero))
            .collect();
        let reach_out_image = degrade("reach_out", reach_out)
            .first()
            .map(|r| transform::responsive(&r.url, &self.profiles.reach_out));
        let stats_image = degrade("stats", stats)
            .first()
            .map(|r| transform::responsive(&r.url, &self.profiles.stats));
        let client_photos: Vec<ImageRef> = degrade("client_photos", clients)
            .into_iter()
            .map(|r| ImageRef {
                src: transform::thumbnail(&r.url, &self.profiles.client_photo),
                public_id: r.public_id,
            })
            .collect();
        let testimonials = degrade("testimonials", testimonials);

        info!(
            hero = hero_images.len(),
            reach_out = reach_out_image.is_some(),
            stats = stats_image.is_some(),
            client_photos = client_photos.len(),
            testimonials = testimonials.len(),
            "bootstrap composed"
        );

        Ok(BootstrapPayload {
            hero_images,
            reach_out_image,
            stats_image,
            client_photos,
            testimonials,
            fetched_at: now_millis(),
            error: None,
        })
    }

    /// [`compose`](Self::compose), with a total failure turned into the empty
    /// payload shape carrying an `error` marker.
    pub async fn compose_or_degraded(&self) -> BootstrapPayload {
        match self.compose().await {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "bootstrap composition failed");
                BootstrapPayload::degraded(now_millis(), "Failed to load bootstrap data")
            }
        }
    }
}

fn check_profile(group: &'static str, profile: &ResponsiveProfile) -> Result<(), BootstrapError> {
    if profile.widths.is_empty() {
        return Err(BootstrapError::InvalidProfile {
            group,
            reason: "no widths".into(),
        });
    }
    if profile.widths.contains(&0) {
        return Err(BootstrapError::InvalidProfile {
            group,
            reason: "zero width".into(),
        });
    }
    Ok(())
}

fn degrade<T, E: std::fmt::Display>(branch: &str, result: Result<Vec<T>, E>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(branch, error = %e, "bootstrap branch failed, using empty default");
        Vec::new()
    })
}
