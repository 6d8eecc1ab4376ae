//! CLI output formatting for the one-shot commands.
//!
//! # Information-First Display
//!
//! Output leads with what a site editor recognises (folder display names and
//! image titles) with remote identifiers shown as indented context lines. Every
//! entity follows the same two-level pattern:
//!
//! 1. **Header line**: positional index + title (+ optional detail)
//! 2. **Context lines**: indented `Source:`, `Category:`, `Error:`, ...
//!
//! # Output Format
//!
//! ## Gallery
//!
//! ```text
//! Folders
//! 001 House Work (2 photos)
//!     Source: sai-photo/album/house-work
//!     Category: filter-app
//! 002 Customized Work (failed)
//!     Source: sai-photo/album/customized-work
//!     Error: remote store returned status 500
//!
//! Page (offset 0, limit 20)
//! 001 House Work 1
//!     Source: sai-photo/album/house-work/IMG_0412
//!     URL: https://res.cloudinary.com/.../upload/f_auto,q_auto/...
//!
//! Showing 2 of 2 images
//! ```
//!
//! ## Check
//!
//! ```text
//! Config
//!     Listen: 127.0.0.1:3000/api
//!     Store: https://api.cloudinary.com/v1_1 (cloud demo)
//!     Testimonials: file content/testimonials.json
//! Gallery folders
//! 001 House Work
//!     Source: sai-photo/album/house-work
//!     Category: filter-app
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::aggregate::{FolderOutcome, FolderReport};
use crate::config::{ServiceConfig, TestimonialSourceKind};
use crate::naming::folder_display_name;
use crate::query::GalleryPage;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional detail.
///
/// ```text
/// 001 House Work (5 photos)
/// 001 House Work
/// ```
fn entity_header(index: usize, title: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), title, d),
        None => format!("{} {}", format_index(index), title),
    }
}

fn photo_count(n: usize) -> String {
    if n == 1 {
        "1 photo".to_string()
    } else {
        format!("{} photos", n)
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// Format one gallery query: per-folder outcomes, then the page items.
pub fn format_gallery_output(page: &GalleryPage, reports: &[FolderReport]) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Folders".to_string());
    for (i, report) in reports.iter().enumerate() {
        match &report.outcome {
            FolderOutcome::Loaded(n) => {
                lines.push(entity_header(i + 1, &report.display_name, Some(&photo_count(*n))));
                lines.push(format!("{}Source: {}", indent(1), report.path));
                lines.push(format!("{}Category: {}", indent(1), report.category));
            }
            FolderOutcome::Failed(reason) => {
                lines.push(entity_header(i + 1, &report.display_name, Some("failed")));
                lines.push(format!("{}Source: {}", indent(1), report.path));
                lines.push(format!("{}Error: {}", indent(1), reason));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Page (offset {}, limit {})",
        page.offset, page.limit
    ));
    for (i, item) in page.images.iter().enumerate() {
        lines.push(entity_header(page.offset + i + 1, &item.title, None));
        lines.push(format!("{}Source: {}", indent(1), item.public_id));
        lines.push(format!("{}URL: {}", indent(1), item.src));
    }

    if let Some(message) = &page.message {
        lines.push(format!("Error: {}", message));
    }

    lines.push(String::new());
    let more = if page.has_more {
        ", more available"
    } else {
        ""
    };
    lines.push(format!(
        "Showing {} of {} images{}",
        page.images.len(),
        page.total,
        more
    ));

    lines
}

/// Print gallery output to stdout.
pub fn print_gallery_output(page: &GalleryPage, reports: &[FolderReport]) {
    for line in format_gallery_output(page, reports) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the resolved configuration summary printed by `check`.
pub fn format_check_output(config: &ServiceConfig, cloud_name: &str) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Config".to_string());
    lines.push(format!(
        "{}Listen: {}{}",
        indent(1),
        config.server.bind,
        config.server.base_path
    ));
    lines.push(format!(
        "{}Store: {} (cloud {})",
        indent(1),
        config.store.api_base,
        cloud_name
    ));
    let testimonials = match config.testimonials.source {
        TestimonialSourceKind::File => format!("file {}", config.testimonials.path),
        TestimonialSourceKind::Http => format!(
            "http {}",
            config.testimonials.url.as_deref().unwrap_or_default()
        ),
    };
    lines.push(format!("{}Testimonials: {}", indent(1), testimonials));

    lines.push("Gallery folders".to_string());
    for (i, folder) in config.gallery.folders.iter().enumerate() {
        lines.push(entity_header(i + 1, &folder_display_name(folder), None));
        lines.push(format!("{}Source: {}", indent(1), folder.path));
        lines.push(format!("{}Category: {}", indent(1), folder.category));
    }

    lines.push("Landing page".to_string());
    let b = &config.bootstrap;
    for (label, folder) in [
        ("Hero", &b.hero_folder),
        ("Reach out", &b.reach_out_folder),
        ("Stats", &b.stats_folder),
        ("Client photos", &b.client_photos_folder),
        ("Reach out (standalone)", &b.reach_out_bg_folder),
        ("Stats (standalone)", &b.stats_clients_folder),
    ] {
        lines.push(format!("{}{}: {}", indent(1), label, folder));
    }

    lines
}

/// Print check output to stdout.
pub fn print_check_output(config: &ServiceConfig, cloud_name: &str) {
    for line in format_check_output(config, cloud_name) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
