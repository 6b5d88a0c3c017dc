use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::entities;
use crate::http_server::error::{ApiError, Report};
use crate::http_server::state::AppState;
use crate::services::playlist::{RefreshAllSummary, SyncOutcome};
use crate::services::playlist::reconcile::SyncReport;

#[derive(Debug, Clone, Deserialize)]
pub struct AddPlaylistInput {
    /// Playlist URL or bare playlist id.
    url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistResponse {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub thumbnail: String,
    pub item_count: i64,
    pub updated_at: String,
}

impl From<entities::playlist::Model> for PlaylistResponse {
    fn from(model: entities::playlist::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            channel: model.channel,
            thumbnail: model.thumbnail,
            item_count: model.item_count,
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItemResponse {
    pub id: String,
    pub playlist_id: String,
    pub title: String,
    pub channel: String,
    pub thumbnail: String,
    pub position: i64,
}

impl From<entities::playlist_item::Model> for PlaylistItemResponse {
    fn from(model: entities::playlist_item::Model) -> Self {
        Self {
            id: model.id,
            playlist_id: model.playlist_id,
            title: model.title,
            channel: model.channel,
            thumbnail: model.thumbnail,
            position: model.position,
        }
    }
}

fn synced(input: &str, outcome: SyncOutcome) -> Result<Json<SyncReport>, Report> {
    match outcome {
        SyncOutcome::Synced(report) => Ok(Json(report)),
        SyncOutcome::InvalidInput => Err(ApiError::InvalidInput(input.to_string()).into()),
        SyncOutcome::NotFound(id) => Err(ApiError::NotFound(id).into()),
    }
}

pub async fn list_playlists(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<PlaylistResponse>>, Report> {
    let playlists = app_state.playlist_service().list_playlists().await?;

    Ok(Json(playlists.into_iter().map(Into::into).collect()))
}

#[axum::debug_handler]
pub async fn add_playlist(
    State(app_state): State<Arc<AppState>>,
    Json(input): Json<AddPlaylistInput>,
) -> Result<Json<SyncReport>, Report> {
    let outcome = app_state
        .playlist_service()
        .add_or_refresh(&input.url)
        .await?;

    synced(&input.url, outcome)
}

pub async fn get_playlist(
    State(app_state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<Json<PlaylistResponse>, Report> {
    let playlist = app_state
        .playlist_service()
        .get_playlist(&playlist_id)
        .await?
        .ok_or(ApiError::NotFound(playlist_id))?;

    Ok(Json(playlist.into()))
}

pub async fn get_playlist_items(
    State(app_state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<Json<Vec<PlaylistItemResponse>>, Report> {
    let service = app_state.playlist_service();

    if service.get_playlist(&playlist_id).await?.is_none() {
        return Err(ApiError::NotFound(playlist_id).into());
    }

    let items = service.get_items(&playlist_id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn refresh_playlist(
    State(app_state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<Json<SyncReport>, Report> {
    let report = app_state
        .playlist_service()
        .refresh(&playlist_id)
        .await?
        .ok_or(ApiError::NotFound(playlist_id))?;

    Ok(Json(report))
}

pub async fn refresh_all_playlists(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<RefreshAllSummary>, Report> {
    let summary = app_state.playlist_service().refresh_all().await?;

    Ok(Json(summary))
}

pub async fn delete_playlist(
    State(app_state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<StatusCode, Report> {
    if app_state
        .playlist_service()
        .delete_playlist(&playlist_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(playlist_id).into())
    }
}
