pub mod playlists;
