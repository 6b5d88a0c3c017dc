use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{YoutubeListResponse, YoutubeThumbnails};

/// A playlist resource from `GET /playlists`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubePlaylist {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub snippet: YoutubePlaylistSnippet,

    #[serde(rename = "contentDetails", default)]
    pub content_details: YoutubePlaylistContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubePlaylistSnippet {
    #[serde(default)]
    pub title: String,

    #[serde(rename = "channelTitle", default)]
    pub channel_title: Option<String>,

    #[serde(default)]
    pub thumbnails: YoutubeThumbnails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubePlaylistContentDetails {
    #[serde(rename = "itemCount", default)]
    pub item_count: Option<i64>,
}

/// Fetch a single playlist's metadata.
///
/// Endpoint
/// - `GET /playlists?part=snippet,contentDetails&id={id}`
///
/// Returns
/// - `None` when the API knows no playlist with that id.
pub async fn get_playlist(
    client: &Client,
    base_url: &Url,
    api_key: &str,
    playlist_id: &str,
) -> Result<Option<YoutubePlaylist>> {
    let url = base_url.join("playlists")?;

    let res = client
        .get(url)
        .query(&[
            ("part", "snippet,contentDetails"),
            ("id", playlist_id),
            ("key", api_key),
        ])
        .send()
        .await?
        .error_for_status()?
        .json::<YoutubeListResponse<YoutubePlaylist>>()
        .await
        .wrap_err("Failed to deserialize playlist response")?;

    Ok(res.items.into_iter().next())
}
