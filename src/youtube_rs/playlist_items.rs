use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{MAX_PAGE_SIZE, YoutubeListResponse, YoutubeThumbnails};

/// A playlist item resource from `GET /playlistItems`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubePlaylistItem {
    #[serde(default)]
    pub snippet: YoutubePlaylistItemSnippet,

    #[serde(rename = "contentDetails", default)]
    pub content_details: YoutubePlaylistItemContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubePlaylistItemSnippet {
    #[serde(default)]
    pub title: String,

    #[serde(rename = "channelTitle", default)]
    pub channel_title: Option<String>,

    #[serde(default)]
    pub thumbnails: YoutubeThumbnails,

    /// Zero based index of the item inside the playlist.
    #[serde(default)]
    pub position: Option<i64>,

    #[serde(rename = "resourceId", default)]
    pub resource_id: Option<YoutubeResourceId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubeResourceId {
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubePlaylistItemContentDetails {
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
}

impl YoutubePlaylistItem {
    /// The video id, preferring `contentDetails` over `snippet.resourceId`.
    pub fn video_id(&self) -> Option<&str> {
        let non_empty = |id: &&str| !id.is_empty();

        self.content_details
            .video_id
            .as_deref()
            .filter(non_empty)
            .or_else(|| {
                self.snippet
                    .resource_id
                    .as_ref()
                    .and_then(|r| r.video_id.as_deref())
                    .filter(non_empty)
            })
    }
}

/// Fetch one page of items from a playlist.
///
/// Pagination
/// - Pass `None` for the first page.
/// - Pass the previous response's `next_page_token` for the following pages.
///
/// Endpoint
/// - `GET /playlistItems?part=snippet,contentDetails&playlistId={id}&maxResults=50`
pub async fn get_playlist_items_page(
    client: &Client,
    base_url: &Url,
    api_key: &str,
    playlist_id: &str,
    page_token: Option<&str>,
) -> Result<YoutubeListResponse<YoutubePlaylistItem>> {
    let url = base_url.join("playlistItems")?;
    let max_results = MAX_PAGE_SIZE.to_string();

    let mut query = vec![
        ("part", "snippet,contentDetails"),
        ("playlistId", playlist_id),
        ("maxResults", max_results.as_str()),
        ("key", api_key),
    ];
    if let Some(token) = page_token {
        query.push(("pageToken", token));
    }

    let res = client
        .get(url)
        .query(&query)
        .send()
        .await?
        .error_for_status()?
        .json::<YoutubeListResponse<YoutubePlaylistItem>>()
        .await
        .wrap_err("Failed to deserialize playlist items page")?;

    Ok(res)
}
