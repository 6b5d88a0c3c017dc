pub mod playlist;
pub mod youtube;
