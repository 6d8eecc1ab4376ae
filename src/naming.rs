//! Display names derived from remote folder paths.
//!
//! Folders in the media store are path-like prefixes whose last segment is a
//! kebab-case slug. The gallery shows that slug as a title:
//!
//! - `sai-photo/album/house-work` → folder name `house-work`, title "House Work"
//! - `sai-photo/album/hotel-apartments` → "Hotel Apartments"
//! - `sai-photo/hero` → "Hero"
//!
//! Individual gallery items append their 1-based position within the folder:
//! "House Work 1", "House Work 2", ...

use crate::types::FolderSpec;

/// Trailing path segment of a folder prefix.
///
/// Trailing slashes are ignored, so `"a/b/"` and `"a/b"` both yield `"b"`.
/// A path without slashes is its own name.
pub fn folder_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Title-case a kebab-case slug: split on `-`, capitalize each token's first
/// character, join with spaces. The rest of each token is left as-is.
pub fn display_title(name: &str) -> String {
    name.split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display name for a folder: its configured override, or the title derived
/// from its trailing segment.
pub fn folder_display_name(folder: &FolderSpec) -> String {
    match &folder.title {
        Some(title) => title.clone(),
        None => display_title(folder_name(&folder.path)),
    }
}

/// Title of the `position`-th (1-based) item in a folder.
pub fn item_title(display_name: &str, position: usize) -> String {
    format!("{display_name} {position}")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
