use async_stream::try_stream;
use color_eyre::eyre::Result;
use futures::{Stream, TryStreamExt};
use url::Url;

use super::fingerprint::{item_fingerprint, playlist_fingerprint};
use crate::ports::youtube::YoutubeClient;
use crate::youtube_rs::YoutubeThumbnails;
use crate::youtube_rs::playlist_items::YoutubePlaylistItem;
use crate::youtube_rs::playlists::YoutubePlaylist;

/// Shortest input accepted as a bare playlist id.
const MIN_RAW_ID_LEN: usize = 8;

/// Playlist metadata as it should be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPlaylist {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub thumbnail: String,
    pub item_count: i64,
    pub fingerprint: String,
}

/// One playlist entry as it should be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedItem {
    pub id: String,
    pub playlist_id: String,
    pub title: String,
    pub channel: String,
    pub thumbnail: String,
    pub position: i64,
    pub fingerprint: String,
}

/// The complete remote state of one playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSnapshot {
    pub playlist: FetchedPlaylist,
    pub items: Vec<FetchedItem>,
}

/// Pull a playlist id out of a bare id or a URL carrying `list=`.
pub fn extract_playlist_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    // Surrounding whitespace is never part of an id, so it does not count
    // towards the minimum length.
    if !input.contains("://") && input.chars().count() >= MIN_RAW_ID_LEN {
        return Some(input.to_string());
    }

    let url = Url::parse(input).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "list")
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Pick medium, then high, then default. Empty when none carries a URL.
pub fn select_thumbnail(thumbnails: &YoutubeThumbnails) -> String {
    [&thumbnails.medium, &thumbnails.high, &thumbnails.default]
        .into_iter()
        .flatten()
        .find(|thumbnail| !thumbnail.url.is_empty())
        .map(|thumbnail| thumbnail.url.clone())
        .unwrap_or_default()
}

pub fn normalize_playlist(playlist_id: &str, raw: &YoutubePlaylist) -> FetchedPlaylist {
    let title = raw.snippet.title.clone();
    let thumbnail = select_thumbnail(&raw.snippet.thumbnails);
    let item_count = raw.content_details.item_count.unwrap_or(0);
    let fingerprint = playlist_fingerprint(&title, &thumbnail, item_count);

    FetchedPlaylist {
        id: playlist_id.to_string(),
        title,
        channel: raw
            .snippet
            .channel_title
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        thumbnail,
        item_count,
        fingerprint,
    }
}

/// `None` when the entry has no video id (deleted or private videos).
pub fn normalize_item(playlist_id: &str, raw: &YoutubePlaylistItem) -> Option<FetchedItem> {
    let id = raw.video_id()?.to_string();
    let title = raw.snippet.title.clone();
    let thumbnail = select_thumbnail(&raw.snippet.thumbnails);
    let position = raw.snippet.position.unwrap_or(0);
    let fingerprint = item_fingerprint(&title, &thumbnail, position);

    Some(FetchedItem {
        id,
        playlist_id: playlist_id.to_string(),
        title,
        channel: raw.snippet.channel_title.clone().unwrap_or_default(),
        thumbnail,
        position,
        fingerprint,
    })
}

/// Lazily walk every page of a playlist, following continuation tokens
/// until the API stops returning one. The stream can only be consumed once.
pub fn item_stream<'a>(
    client: &'a dyn YoutubeClient,
    playlist_id: &'a str,
) -> impl Stream<Item = Result<FetchedItem>> + Send + 'a {
    try_stream! {
        let mut page_token: Option<String> = None;
        loop {
            let page = client.playlist_items_page(playlist_id, page_token.take()).await?;
            tracing::debug!(
                playlist_id,
                items = page.items.len(),
                has_next = page.next_page_token.is_some(),
                "Fetched playlist items page",
            );

            for raw in &page.items {
                match normalize_item(playlist_id, raw) {
                    Some(item) => yield item,
                    None => tracing::debug!(playlist_id, "Skipping playlist item without a video id"),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
    }
}

pub async fn fetch_items(client: &dyn YoutubeClient, playlist_id: &str) -> Result<Vec<FetchedItem>> {
    item_stream(client, playlist_id).try_collect().await
}

/// Fetch metadata and every item of a playlist.
///
/// Returns `None` when the playlist is unknown or has no items. Transport
/// and decoding errors are returned as-is, without retry.
pub async fn fetch_playlist(
    client: &dyn YoutubeClient,
    playlist_id: &str,
) -> Result<Option<PlaylistSnapshot>> {
    let Some(raw) = client.playlist(playlist_id).await? else {
        tracing::info!(playlist_id, "Playlist not found on YouTube");
        return Ok(None);
    };
    let playlist = normalize_playlist(playlist_id, &raw);

    let items = fetch_items(client, playlist_id).await?;
    if items.is_empty() {
        tracing::info!(playlist_id, "Playlist has no items");
        return Ok(None);
    }

    Ok(Some(PlaylistSnapshot { playlist, items }))
}
