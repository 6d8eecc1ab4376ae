//! Gallery paging and category filtering.
//!
//! A request narrows the configured folder set by category *before* anything
//! is fetched, aggregates the remaining folders, then slices one page out of
//! the merged sequence:
//!
//! ```text
//! folders ─filter(category)─▶ dispatched ─aggregate─▶ items ─slice─▶ page
//! ```
//!
//! `total` counts the filtered items before slicing, so the presentation layer
//! can render "load more" from `hasMore` alone.

use crate::aggregate::{FolderReport, aggregate, total_failure};
use crate::config::{DeliveryProfile, GalleryConfig};
use crate::fetch::Fetcher;
use crate::naming::folder_name;
use crate::types::{FolderSpec, GalleryItem};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::error;

/// Paging and filter parameters of one gallery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryQuery {
    /// Restrict to folders with this category.
    pub category: Option<String>,
    pub offset: usize,
    /// Always positive.
    pub limit: usize,
}

impl GalleryQuery {
    pub fn new(default_limit: usize) -> Self {
        Self {
            category: None,
            offset: 0,
            limit: default_limit.max(1),
        }
    }

    /// Parse raw query-string values. Numbers are read from their leading
    /// digits (`10abc` is 10, ` +5` is 5). A value with no leading digits,
    /// a negative one, or one too large for `usize` falls back to the
    /// default, as does `limit=0`. An empty `category` means no filter.
    pub fn from_params(params: &HashMap<String, String>, default_limit: usize) -> Self {
        let default_limit = default_limit.max(1);
        let limit = params
            .get("limit")
            .and_then(|v| leading_integer(v))
            .filter(|&n| n > 0)
            .unwrap_or(default_limit);
        let offset = params
            .get("offset")
            .and_then(|v| leading_integer(v))
            .unwrap_or(0);
        let category = params
            .get("category")
            .filter(|c| !c.is_empty())
            .cloned();
        Self {
            category,
            offset,
            limit,
        }
    }
}

/// Unsigned integer from the leading digits of `raw`, after optional
/// whitespace and `+`.
fn leading_integer(raw: &str) -> Option<usize> {
    let rest = raw.trim_start();
    let rest = rest.strip_prefix('+').unwrap_or(rest);
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// One page of the gallery, as served by `/gallery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPage {
    pub images: Vec<GalleryItem>,
    /// Filtered item count before slicing.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
    /// Number of configured folders.
    pub folders: usize,
    /// Category → first dispatched folder name carrying it.
    pub category_folder_map: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GalleryPage {
    /// Empty page with the request's paging echoed back and an error marker.
    pub fn degraded(query: &GalleryQuery, folders: usize, message: impl Into<String>) -> Self {
        Self {
            images: Vec::new(),
            total: 0,
            offset: query.offset,
            limit: query.limit,
            has_more: false,
            folders,
            category_folder_map: BTreeMap::new(),
            error: Some("Failed to fetch gallery images".to_string()),
            message: Some(message.into()),
        }
    }

    /// This page, or [`degraded`](Self::degraded) when every dispatched
    /// folder failed.
    pub fn unless_total_failure(self, query: &GalleryQuery, reports: &[FolderReport]) -> Self {
        match total_failure(reports) {
            Some(reason) => {
                error!(reason, "every gallery folder failed");
                Self::degraded(query, self.folders, reason)
            }
            None => self,
        }
    }
}

/// Folders matching the category, in declaration order. No category keeps all.
pub fn select_folders<'a>(
    folders: &'a [FolderSpec],
    category: Option<&str>,
) -> Vec<&'a FolderSpec> {
    folders
        .iter()
        .filter(|f| category.is_none_or(|c| f.category == c))
        .collect()
}

/// First folder name seen for each category.
pub fn category_folder_map<'a>(
    folders: impl IntoIterator<Item = &'a FolderSpec>,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for folder in folders {
        map.entry(folder.category.clone())
            .or_insert_with(|| folder_name(&folder.path).to_string());
    }
    map
}

/// Slice `[offset, offset + limit)` out of `items`. Returns the page and
/// whether anything follows it.
pub fn paginate(items: Vec<GalleryItem>, offset: usize, limit: usize) -> (Vec<GalleryItem>, bool) {
    let total = items.len();
    let has_more = offset.saturating_add(limit) < total;
    let page = items.into_iter().skip(offset).take(limit).collect();
    (page, has_more)
}

/// Run one gallery request: filter, aggregate, paginate. Per-folder outcomes
/// are returned alongside for callers that report them.
pub async fn run_query(
    fetcher: &Fetcher,
    gallery: &GalleryConfig,
    profile: &DeliveryProfile,
    query: &GalleryQuery,
) -> (GalleryPage, Vec<FolderReport>) {
    let dispatched: Vec<FolderSpec> = select_folders(&gallery.folders, query.category.as_deref())
        .into_iter()
        .cloned()
        .collect();
    let map = category_folder_map(&dispatched);
    let aggregation = aggregate(fetcher, &dispatched, profile, gallery.max_results).await;
    let total = aggregation.items.len();
    let (images, has_more) = paginate(aggregation.items, query.offset, query.limit);
    let page = GalleryPage {
        images,
        total,
        offset: query.offset,
        limit: query.limit,
        has_more,
        folders: gallery.folders.len(),
        category_folder_map: map,
        error: None,
        message: None,
    };
    (page, aggregation.reports)
}

/// [`run_query`], keeping only the page.
pub async fn query_gallery(
    fetcher: &Fetcher,
    gallery: &GalleryConfig,
    profile: &DeliveryProfile,
    query: &GalleryQuery,
) -> GalleryPage {
    run_query(fetcher, gallery, profile, query).await.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockStore, fetcher_for, house_and_custom, resources};

    const HOUSE: &str = "sai-photo/album/house-work";
    const CUSTOM: &str = "sai-photo/album/customized-work";

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn two_folder_gallery() -> GalleryConfig {
        GalleryConfig {
            folders: house_and_custom(),
            ..GalleryConfig::default()
        }
    }

    fn titles(items: &[GalleryItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    fn items(n: usize) -> Vec<GalleryItem> {
        (0..n)
            .map(|i| GalleryItem {
                src: format!("https://x/upload/{i}.jpg"),
                category: "c".into(),
                title: format!("Item {}", i + 1),
                public_id: format!("p/{i}"),
                width: None,
                height: None,
                format: None,
                folder_name: "p".into(),
            })
            .collect()
    }

    // =========================================================================
    // Parameter parsing
    // =========================================================================

    #[test]
    fn params_defaults_when_missing() {
        let q = GalleryQuery::from_params(&HashMap::new(), 20);
        assert_eq!(q, GalleryQuery::new(20));
    }

    #[test]
    fn params_parse_numbers_and_category() {
        let q = GalleryQuery::from_params(
            &params(&[("limit", "5"), ("offset", "10"), ("category", "filter-app")]),
            20,
        );
        assert_eq!(q.limit, 5);
        assert_eq!(q.offset, 10);
        assert_eq!(q.category.as_deref(), Some("filter-app"));
    }

    #[test]
    fn params_garbage_falls_back_to_defaults() {
        let q = GalleryQuery::from_params(
            &params(&[("limit", "abc"), ("offset", "-3"), ("category", "")]),
            20,
        );
        assert_eq!(q, GalleryQuery::new(20));
    }

    #[test]
    fn params_read_leading_digits() {
        let q = GalleryQuery::from_params(
            &params(&[("limit", "10abc"), ("offset", " +4px")]),
            20,
        );
        assert_eq!(q.limit, 10);
        assert_eq!(q.offset, 4);
    }

    #[test]
    fn leading_integer_edge_cases() {
        assert_eq!(leading_integer("007"), Some(7));
        assert_eq!(leading_integer("3.9"), Some(3));
        assert_eq!(leading_integer(""), None);
        assert_eq!(leading_integer("+"), None);
        assert_eq!(leading_integer("-1"), None);
        assert_eq!(leading_integer("x1"), None);
        assert_eq!(leading_integer("99999999999999999999999"), None);
    }

    #[test]
    fn params_zero_limit_uses_default() {
        let q = GalleryQuery::from_params(&params(&[("limit", "0")]), 12);
        assert_eq!(q.limit, 12);
    }

    // =========================================================================
    // Pure helpers
    // =========================================================================

    #[test]
    fn select_without_category_keeps_all_in_order() {
        let folders = house_and_custom();
        let selected = select_folders(&folders, None);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].path, HOUSE);
    }

    #[test]
    fn select_unknown_category_is_empty() {
        let folders = house_and_custom();
        assert!(select_folders(&folders, Some("filter-none")).is_empty());
    }

    #[test]
    fn category_map_keeps_first_folder() {
        let folders = vec![
            FolderSpec::new("a/first", "x"),
            FolderSpec::new("a/second", "x"),
            FolderSpec::new("a/third", "y"),
        ];
        let map = category_folder_map(&folders);
        assert_eq!(map.len(), 2);
        assert_eq!(map["x"], "first");
        assert_eq!(map["y"], "third");
    }

    #[test]
    fn paginate_middle_page() {
        let (page, more) = paginate(items(5), 1, 2);
        assert_eq!(titles(&page), ["Item 2", "Item 3"]);
        assert!(more);
    }

    #[test]
    fn paginate_last_partial_page() {
        let (page, more) = paginate(items(5), 4, 2);
        assert_eq!(titles(&page), ["Item 5"]);
        assert!(!more);
    }

    #[test]
    fn paginate_exact_end_has_no_more() {
        let (page, more) = paginate(items(4), 2, 2);
        assert_eq!(page.len(), 2);
        assert!(!more);
    }

    #[test]
    fn paginate_offset_past_end_is_empty() {
        for offset in [5, 6, 100] {
            let (page, more) = paginate(items(5), offset, 3);
            assert!(page.is_empty());
            assert!(!more);
        }
    }

    #[test]
    fn paginate_huge_offset_does_not_overflow() {
        let (page, more) = paginate(items(3), usize::MAX, usize::MAX);
        assert!(page.is_empty());
        assert!(!more);
    }

    #[test]
    fn has_more_matches_bound_for_all_small_inputs() {
        for total in 0..6 {
            for offset in 0..8 {
                for limit in 1..5 {
                    let (_, more) = paginate(items(total), offset, limit);
                    assert_eq!(more, offset + limit < total, "{total}/{offset}/{limit}");
                }
            }
        }
    }

    // =========================================================================
    // End to end
    // =========================================================================

    #[tokio::test]
    async fn first_page_of_two_folders() {
        let (fetcher, _) = fetcher_for(
            MockStore::default()
                .with_folder(HOUSE, resources(HOUSE, 2))
                .with_folder(CUSTOM, resources(CUSTOM, 1)),
        );
        let query = GalleryQuery {
            limit: 2,
            ..GalleryQuery::new(20)
        };
        let page = query_gallery(
            &fetcher,
            &two_folder_gallery(),
            &DeliveryProfile::default(),
            &query,
        )
        .await;
        assert_eq!(titles(&page.images), ["House Work 1", "House Work 2"]);
        assert!(page.images.iter().all(|i| i.category == "filter-app"));
        assert_eq!(page.total, 3);
        assert!(page.has_more);
        assert_eq!(page.folders, 2);
        assert_eq!(page.category_folder_map["filter-app"], "house-work");
        assert_eq!(page.category_folder_map["filter-product"], "customized-work");
        assert!(page.error.is_none());
    }

    #[tokio::test]
    async fn category_filter_only_dispatches_matching_folders() {
        let (fetcher, store) = fetcher_for(
            MockStore::default()
                .with_folder(HOUSE, resources(HOUSE, 2))
                .with_folder(CUSTOM, resources(CUSTOM, 1)),
        );
        let query = GalleryQuery {
            category: Some("filter-product".into()),
            ..GalleryQuery::new(20)
        };
        let page = query_gallery(
            &fetcher,
            &two_folder_gallery(),
            &DeliveryProfile::default(),
            &query,
        )
        .await;
        assert_eq!(titles(&page.images), ["Customized Work 1"]);
        assert_eq!(page.total, 1);
        assert!(!page.has_more);
        assert_eq!(store.called_prefixes(), [CUSTOM]);
        assert_eq!(page.folders, 2);
        assert_eq!(page.category_folder_map.len(), 1);
    }

    #[tokio::test]
    async fn filtered_equals_unfiltered_restricted() {
        let store = || {
            MockStore::default()
                .with_folder(HOUSE, resources(HOUSE, 3))
                .with_folder(CUSTOM, resources(CUSTOM, 2))
        };
        let gallery = two_folder_gallery();
        let all = {
            let (fetcher, _) = fetcher_for(store());
            query_gallery(
                &fetcher,
                &gallery,
                &DeliveryProfile::default(),
                &GalleryQuery::new(100),
            )
            .await
        };
        for category in ["filter-app", "filter-product"] {
            let (fetcher, _) = fetcher_for(store());
            let query = GalleryQuery {
                category: Some(category.into()),
                ..GalleryQuery::new(100)
            };
            let filtered =
                query_gallery(&fetcher, &gallery, &DeliveryProfile::default(), &query).await;
            let expected: Vec<GalleryItem> = all
                .images
                .iter()
                .filter(|i| i.category == category)
                .cloned()
                .collect();
            assert_eq!(filtered.images, expected);
        }
    }

    #[tokio::test]
    async fn failing_folder_shrinks_total_and_is_reported() {
        let (fetcher, _) = fetcher_for(
            MockStore::default()
                .with_failure(HOUSE, 503)
                .with_folder(CUSTOM, resources(CUSTOM, 2)),
        );
        let (page, reports) = run_query(
            &fetcher,
            &two_folder_gallery(),
            &DeliveryProfile::default(),
            &GalleryQuery::new(20),
        )
        .await;
        assert_eq!(page.total, 2);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].path, HOUSE);
        // the map describes dispatched folders, not successful ones
        assert!(page.category_folder_map.contains_key("filter-app"));
    }

    #[tokio::test]
    async fn offset_beyond_total_is_empty_page() {
        let (fetcher, _) =
            fetcher_for(MockStore::default().with_folder(HOUSE, resources(HOUSE, 2)));
        let query = GalleryQuery {
            offset: 7,
            ..GalleryQuery::new(20)
        };
        let page = query_gallery(
            &fetcher,
            &two_folder_gallery(),
            &DeliveryProfile::default(),
            &query,
        )
        .await;
        assert!(page.images.is_empty());
        assert_eq!(page.total, 2);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn every_folder_failing_degrades_the_page() {
        let (fetcher, _) = fetcher_for(
            MockStore::default()
                .with_failure(HOUSE, 500)
                .with_failure(CUSTOM, 500),
        );
        let query = GalleryQuery::new(20);
        let (page, reports) = run_query(
            &fetcher,
            &two_folder_gallery(),
            &DeliveryProfile::default(),
            &query,
        )
        .await;
        let page = page.unless_total_failure(&query, &reports);
        assert_eq!(page.error.as_deref(), Some("Failed to fetch gallery images"));
        assert_eq!(page.message.as_deref(), Some("remote store returned status 500"));
        assert_eq!(page.folders, 2);
        assert!(page.images.is_empty());
    }

    #[tokio::test]
    async fn partial_failure_keeps_the_page() {
        let (fetcher, _) = fetcher_for(
            MockStore::default()
                .with_failure(HOUSE, 500)
                .with_folder(CUSTOM, resources(CUSTOM, 1)),
        );
        let query = GalleryQuery::new(20);
        let (page, reports) = run_query(
            &fetcher,
            &two_folder_gallery(),
            &DeliveryProfile::default(),
            &query,
        )
        .await;
        let page = page.unless_total_failure(&query, &reports);
        assert!(page.error.is_none());
        assert_eq!(page.total, 1);
    }

    #[test]
    fn page_serializes_camel_case() {
        let page = GalleryPage::degraded(&GalleryQuery::new(20), 5, "boom");
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["hasMore"], false);
        assert_eq!(json["categoryFolderMap"], serde_json::json!({}));
        assert_eq!(json["folders"], 5);
        assert_eq!(json["error"], "Failed to fetch gallery images");
        assert_eq!(json["message"], "boom");
        assert_eq!(json["limit"], 20);
    }

    #[test]
    fn healthy_page_omits_error_fields() {
        let page = GalleryPage {
            error: None,
            message: None,
            ..GalleryPage::degraded(&GalleryQuery::new(20), 0, "")
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("message").is_none());
    }
}
