pub mod playlist;
pub mod playlist_item;
