//! Folder aggregation: many remote folders into one ordered gallery.
//!
//! Every folder is listed concurrently, then the results are merged strictly
//! by folder position. The merged order never depends on which listing
//! finished first:
//!
//! ```text
//! folders:   [house-work, customized-work, construction-work]
//! finished:   construction-work, house-work, customized-work
//! merged:    [House Work 1, House Work 2, Customized Work 1, Construction Work 1, ...]
//! ```
//!
//! A folder whose listing fails contributes nothing; the others are still
//! merged. Failures are logged and reported per folder in [`FolderReport`].

use crate::config::DeliveryProfile;
use crate::fetch::{FetchError, Fetcher};
use crate::naming::{folder_display_name, folder_name, item_title};
use crate::transform;
use crate::types::{FolderSpec, GalleryItem, ImageResource};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// What happened to one folder's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// Listed successfully with this many items.
    Loaded(usize),
    /// Listing failed; the folder contributed nothing.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderReport {
    pub path: String,
    pub category: String,
    pub display_name: String,
    pub outcome: FolderOutcome,
}

/// Merged gallery plus per-folder outcomes, in folder order.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub items: Vec<GalleryItem>,
    pub reports: Vec<FolderReport>,
}

/// List every folder concurrently and merge the results in folder order.
pub async fn aggregate(
    fetcher: &Fetcher,
    folders: &[FolderSpec],
    profile: &DeliveryProfile,
    max_results: u32,
) -> Aggregation {
    let in_flight = fetcher.max_in_flight().unwrap_or(folders.len()).max(1);
    let listings: Vec<_> = folders
        .iter()
        .map(|folder| fetcher.fetch(&folder.path, max_results))
        .collect();
    // `buffered` yields results in input order regardless of completion order.
    let results: Vec<Result<Vec<ImageResource>, FetchError>> = stream::iter(listings)
        .buffered(in_flight)
        .collect()
        .await;
    merge(folders, results, profile)
}

/// [`aggregate`], keeping only the items.
pub async fn list_gallery(
    fetcher: &Fetcher,
    folders: &[FolderSpec],
    profile: &DeliveryProfile,
    max_results: u32,
) -> Vec<GalleryItem> {
    aggregate(fetcher, folders, profile, max_results).await.items
}

/// Reason of the first failure when every folder failed. `None` when at least
/// one folder listed (even empty) or nothing was dispatched.
pub fn total_failure(reports: &[FolderReport]) -> Option<&str> {
    let mut first = None;
    for report in reports {
        match &report.outcome {
            FolderOutcome::Loaded(_) => return None,
            FolderOutcome::Failed(reason) => {
                first.get_or_insert(reason.as_str());
            }
        }
    }
    first
}

/// Join listing results with their folders. `results[i]` belongs to
/// `folders[i]`.
pub fn merge(
    folders: &[FolderSpec],
    results: Vec<Result<Vec<ImageResource>, FetchError>>,
    profile: &DeliveryProfile,
) -> Aggregation {
    let mut aggregation = Aggregation::default();
    for (folder, result) in folders.iter().zip(results) {
        let display_name = folder_display_name(folder);
        let outcome = match result {
            Ok(resources) => {
                debug!(folder = %folder.path, count = resources.len(), "folder listed");
                let count = resources.len();
                aggregation.items.extend(
                    resources
                        .into_iter()
                        .enumerate()
                        .map(|(i, r)| gallery_item(folder, &display_name, i + 1, r, profile)),
                );
                FolderOutcome::Loaded(count)
            }
            Err(e) => {
                warn!(folder = %folder.path, error = %e, "folder fetch failed, skipping");
                FolderOutcome::Failed(e.to_string())
            }
        };
        aggregation.reports.push(FolderReport {
            path: folder.path.clone(),
            category: folder.category.clone(),
            display_name,
            outcome,
        });
    }
    aggregation
}

fn gallery_item(
    folder: &FolderSpec,
    display_name: &str,
    position: usize,
    resource: ImageResource,
    profile: &DeliveryProfile,
) -> GalleryItem {
    GalleryItem {
        src: transform::delivery(&resource.url, profile),
        category: folder.category.clone(),
        title: item_title(display_name, position),
        public_id: resource.public_id,
        width: resource.width,
        height: resource.height,
        format: resource.format,
        folder_name: folder_name(&folder.path).to_string(),
    }
}
