use std::sync::Arc;

use crate::database::Database;
use crate::ports::youtube::YoutubeClient;
use crate::services::playlist::PlaylistService;

pub struct AppState {
    pub db: Arc<Database>,
    pub youtube: Arc<dyn YoutubeClient>,
}

impl AppState {
    pub fn playlist_service(&self) -> PlaylistService {
        PlaylistService::new(self.db.clone(), self.youtube.clone())
    }
}
