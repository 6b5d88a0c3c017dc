use color_eyre::eyre::Result;

use crate::youtube_rs::YoutubeListResponse;
use crate::youtube_rs::playlist_items::YoutubePlaylistItem;
use crate::youtube_rs::playlists::YoutubePlaylist;

/// Port trait wrapping the YouTube Data API calls used by the fetcher.
///
/// Implementations live in `services::youtube::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait YoutubeClient: Send + Sync {
    /// Playlist metadata, `None` when the API returns no matching playlist.
    async fn playlist(&self, playlist_id: &str) -> Result<Option<YoutubePlaylist>>;

    /// One page of at most 50 items. `page_token` is `None` for the first page.
    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> Result<YoutubeListResponse<YoutubePlaylistItem>>;
}
