pub mod fetch;
pub mod fingerprint;
pub mod reconcile;

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;

use crate::database::Database;
use crate::entities;
use crate::ports::youtube::YoutubeClient;
use fetch::{extract_playlist_id, fetch_playlist};
use reconcile::{SyncReport, reconcile};

/// Outcome of an add or refresh request, decoupled from HTTP types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No playlist id could be read from the input.
    InvalidInput,
    /// YouTube has no such playlist, or it has no items.
    NotFound(String),
    Synced(SyncReport),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshAllSummary {
    pub synced: Vec<SyncReport>,
    pub not_found: Vec<String>,
    pub failed: Vec<String>,
}

pub struct PlaylistService {
    db: Arc<Database>,
    client: Arc<dyn YoutubeClient>,
}

impl PlaylistService {
    pub fn new(db: Arc<Database>, client: Arc<dyn YoutubeClient>) -> Self {
        Self { db, client }
    }

    /// Track a playlist given its id or URL, or refresh it if already tracked.
    #[instrument(skip(self))]
    pub async fn add_or_refresh(&self, input: &str) -> Result<SyncOutcome> {
        let Some(playlist_id) = extract_playlist_id(input) else {
            tracing::info!("No playlist id in input");
            return Ok(SyncOutcome::InvalidInput);
        };

        Ok(match self.refresh(&playlist_id).await? {
            Some(report) => SyncOutcome::Synced(report),
            None => SyncOutcome::NotFound(playlist_id),
        })
    }

    /// Sync a playlist by id. `None` when YouTube has no such playlist or it
    /// has no items.
    #[instrument(skip(self))]
    pub async fn refresh(&self, playlist_id: &str) -> Result<Option<SyncReport>> {
        let Some(snapshot) = fetch_playlist(self.client.as_ref(), playlist_id).await? else {
            return Ok(None);
        };

        let report = reconcile(&self.db.conn, snapshot).await?;
        Ok(Some(report))
    }

    /// Refresh every stored playlist one after another. A failure on one
    /// playlist is logged and does not stop the others.
    #[instrument(skip(self))]
    pub async fn refresh_all(&self) -> Result<RefreshAllSummary> {
        let playlists = self.list_playlists().await?;
        let mut summary = RefreshAllSummary::default();

        for playlist in playlists {
            match self.refresh(&playlist.id).await {
                Ok(Some(report)) => summary.synced.push(report),
                Ok(None) => {
                    tracing::warn!(playlist_id = %playlist.id, "Stored playlist no longer found on YouTube");
                    summary.not_found.push(playlist.id);
                }
                Err(e) => {
                    tracing::error!(
                        playlist_id = %playlist.id,
                        error = ?e,
                        "Failed to refresh playlist",
                    );
                    summary.failed.push(playlist.id);
                }
            }
        }

        Ok(summary)
    }

    pub async fn list_playlists(&self) -> Result<Vec<entities::playlist::Model>> {
        entities::playlist::Entity::find()
            .order_by_asc(entities::playlist::Column::Title)
            .order_by_asc(entities::playlist::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlists")
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<Option<entities::playlist::Model>> {
        entities::playlist::Entity::find_by_id(playlist_id.to_string())
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlist")
    }

    /// Stored items of a playlist in playlist order.
    pub async fn get_items(&self, playlist_id: &str) -> Result<Vec<entities::playlist_item::Model>> {
        entities::playlist_item::Entity::find()
            .filter(entities::playlist_item::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(entities::playlist_item::Column::Position)
            .order_by_asc(entities::playlist_item::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlist items")
    }

    /// Remove a playlist and, through the foreign key, all of its items.
    /// Returns false when the playlist was not stored.
    #[instrument(skip(self))]
    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<bool> {
        let result = entities::playlist::Entity::delete_by_id(playlist_id.to_string())
            .exec(&self.db.conn)
            .await
            .wrap_err("Failed to delete playlist")?;

        tracing::info!(rows = result.rows_affected, "Deleted playlist");
        Ok(result.rows_affected > 0)
    }
}
