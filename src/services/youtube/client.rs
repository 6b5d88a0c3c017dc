use color_eyre::eyre::{Result, eyre};
use reqwest::Client;
use url::Url;

use crate::ports::youtube::YoutubeClient;
use crate::youtube_rs::YoutubeListResponse;
use crate::youtube_rs::playlist_items::{YoutubePlaylistItem, get_playlist_items_page};
use crate::youtube_rs::playlists::{YoutubePlaylist, get_playlist};

pub struct YoutubeHttpAdapter {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl YoutubeHttpAdapter {
    pub fn new(base_url: Url, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl YoutubeClient for YoutubeHttpAdapter {
    async fn playlist(&self, playlist_id: &str) -> Result<Option<YoutubePlaylist>> {
        get_playlist(&self.client, &self.base_url, &self.api_key, playlist_id).await
    }

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> Result<YoutubeListResponse<YoutubePlaylistItem>> {
        get_playlist_items_page(
            &self.client,
            &self.base_url,
            &self.api_key,
            playlist_id,
            page_token.as_deref(),
        )
        .await
    }
}

/// Used by commands that only touch stored rows and need no API key.
/// Every remote call fails.
pub struct OfflineYoutubeClient;

#[async_trait::async_trait]
impl YoutubeClient for OfflineYoutubeClient {
    async fn playlist(&self, playlist_id: &str) -> Result<Option<YoutubePlaylist>> {
        Err(eyre!("Cannot fetch playlist {playlist_id}: no YouTube API key configured"))
    }

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        _page_token: Option<String>,
    ) -> Result<YoutubeListResponse<YoutubePlaylistItem>> {
        Err(eyre!("Cannot fetch items of {playlist_id}: no YouTube API key configured"))
    }
}
