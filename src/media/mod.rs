//! Media classification and aggregation
//!
//! This module owns the vocabulary of the crawl result: what counts as an
//! image, gif, or video, which URLs are site chrome rather than content,
//! and the per-subject store that deduplicates everything that is kept.

mod store;

pub use store::MediaStore;

use std::fmt;

/// The kind of a collected media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaKind {
    Image,
    Gif,
    Video,
}

impl MediaKind {
    /// All kinds, in gallery display order
    pub const ALL: [MediaKind; 3] = [MediaKind::Image, MediaKind::Video, MediaKind::Gif];
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Image => "images",
            MediaKind::Gif => "gifs",
            MediaKind::Video => "videos",
        };
        write!(f, "{}", name)
    }
}

/// One extracted media link, dated and classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub url: String,
    /// `YYYY-MM-DD` publish date, or the window-derived fallback
    pub date: String,
}

/// Classifies an `<img>` source by its URL
///
/// `.gif` sources are tracked separately from still images so the gallery
/// can filter them; everything else that renders in an `<img>` tag counts
/// as an image.
pub fn classify_image_url(url: &str) -> MediaKind {
    if url.to_lowercase().ends_with(".gif") {
        MediaKind::Gif
    } else {
        MediaKind::Image
    }
}

/// URL substrings that mark site chrome rather than post content:
/// avatars, award/badge icons, premium markers, reaction images.
const CHROME_SUBSTRINGS: &[&str] = &[
    "addonflare/awardsystem/icons/",
    "avatars",
    "ozzmodz_badges_badge",
    "premium",
    "likes",
];

/// Returns true if a candidate URL is site chrome or otherwise not content
///
/// Data URIs are rejected outright; everything else is checked against the
/// chrome substring denylist, case-insensitively.
pub fn is_rejected_url(url: &str) -> bool {
    if url.starts_with("data:") {
        return true;
    }
    let lower = url.to_lowercase();
    CHROME_SUBSTRINGS.iter().any(|s| lower.contains(s))
}
