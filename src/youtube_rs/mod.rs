pub mod playlist_items;
pub mod playlists;

use serde::Deserialize;

/// Page size cap enforced by the Data API for list endpoints.
pub const MAX_PAGE_SIZE: u32 = 50;

/* ---------- Shared list envelope ---------- */

/// The list envelope returned by every Data API `list` endpoint.
///
/// Notes
/// - `items` defaults to an empty vec when missing.
/// - `next_page_token` is present only while more pages remain.
#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,

    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

/* ---------- Thumbnails ---------- */

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct YoutubeThumbnail {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Thumbnail variants keyed by resolution. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct YoutubeThumbnails {
    #[serde(default)]
    pub default: Option<YoutubeThumbnail>,
    #[serde(default)]
    pub medium: Option<YoutubeThumbnail>,
    #[serde(default)]
    pub high: Option<YoutubeThumbnail>,
    #[serde(default)]
    pub standard: Option<YoutubeThumbnail>,
    #[serde(default)]
    pub maxres: Option<YoutubeThumbnail>,
}
