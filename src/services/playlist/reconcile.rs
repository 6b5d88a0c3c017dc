use std::collections::{BTreeSet, HashMap, HashSet};

use color_eyre::eyre::{Result, WrapErr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait,
    DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::instrument;

use super::fetch::{FetchedItem, FetchedPlaylist, PlaylistSnapshot};
use crate::entities;

// Keeps `IN (...)` lists well under SQLite's bound parameter limit.
const DELETE_CHUNK_SIZE: usize = 500;

/// What a reconciliation run did to one playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub playlist_id: String,
    /// The playlist row did not exist before this run.
    pub created: bool,
    /// Stored state could not be read, nothing was written.
    pub skipped: bool,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Number of fetched-vs-stored fingerprint comparisons made.
    pub comparisons: usize,
}

/// Three way split between fetched items and stored fingerprints.
///
/// `insert`, `update` and `delete` are pairwise disjoint.
/// `insert ∪ update ∪ unchanged` is the fetched id set and
/// `update ∪ unchanged ∪ delete` is the stored id set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDelta {
    pub insert: BTreeSet<String>,
    pub update: BTreeSet<String>,
    pub delete: BTreeSet<String>,
    pub unchanged: BTreeSet<String>,
    pub comparisons: usize,
}

impl ItemDelta {
    pub fn compute(
        fetched: &HashMap<String, FetchedItem>,
        stored: &HashMap<String, String>,
    ) -> Self {
        let fetched_ids: HashSet<&String> = fetched.keys().collect();
        let stored_ids: HashSet<&String> = stored.keys().collect();

        let mut delta = ItemDelta {
            insert: fetched_ids
                .difference(&stored_ids)
                .map(|id| (*id).clone())
                .collect(),
            delete: stored_ids
                .difference(&fetched_ids)
                .map(|id| (*id).clone())
                .collect(),
            ..Default::default()
        };

        for id in fetched_ids.intersection(&stored_ids) {
            delta.comparisons += 1;
            if fetched[*id].fingerprint == stored[*id] {
                delta.unchanged.insert((*id).clone());
            } else {
                delta.update.insert((*id).clone());
            }
        }

        delta
    }

    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Key fetched items by video id. A video listed twice keeps its last entry.
pub fn index_items(items: Vec<FetchedItem>) -> HashMap<String, FetchedItem> {
    items
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect()
}

/// Bring the stored copy of a playlist in line with a fresh snapshot.
///
/// Everything runs in one transaction. A new playlist is diffed against an
/// empty store, which inserts every item without comparing fingerprints.
/// If the stored fingerprints cannot be read the run is abandoned and the
/// previous state is left as it was.
#[instrument(skip(db, snapshot), fields(playlist_id = %snapshot.playlist.id))]
pub async fn reconcile(db: &DatabaseConnection, snapshot: PlaylistSnapshot) -> Result<SyncReport> {
    let PlaylistSnapshot { playlist, items } = snapshot;
    let fetched = index_items(items);

    let txn = db.begin().await.wrap_err("Failed to begin transaction")?;

    let existing = entities::playlist::Entity::find_by_id(playlist.id.clone())
        .one(&txn)
        .await
        .wrap_err("Failed to look up stored playlist")?;
    let created = existing.is_none();

    let stored = if created {
        insert_playlist(&txn, &playlist).await?;
        HashMap::new()
    } else {
        match load_stored_fingerprints(&txn, &playlist.id).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to load stored items, leaving playlist as is");
                // Dropping the transaction rolls it back.
                drop(txn);
                return Ok(SyncReport {
                    playlist_id: playlist.id,
                    skipped: true,
                    ..Default::default()
                });
            }
        }
    };

    let delta = ItemDelta::compute(&fetched, &stored);
    if delta.is_empty() {
        tracing::debug!("Stored items already match the remote playlist");
    }
    apply_delta(&txn, &fetched, &playlist.id, &delta).await?;

    if !created {
        update_playlist(&txn, &playlist).await?;
    }

    txn.commit()
        .await
        .wrap_err("Failed to commit playlist reconciliation")?;

    let report = SyncReport {
        playlist_id: playlist.id,
        created,
        skipped: false,
        inserted: delta.insert.len(),
        updated: delta.update.len(),
        deleted: delta.delete.len(),
        unchanged: delta.unchanged.len(),
        comparisons: delta.comparisons,
    };
    tracing::info!(
        created = report.created,
        inserted = report.inserted,
        updated = report.updated,
        deleted = report.deleted,
        unchanged = report.unchanged,
        "Playlist reconciled",
    );

    Ok(report)
}

async fn load_stored_fingerprints(
    txn: &DatabaseTransaction,
    playlist_id: &str,
) -> Result<HashMap<String, String>> {
    let rows = entities::playlist_item::Entity::find()
        .select_only()
        .column(entities::playlist_item::Column::Id)
        .column(entities::playlist_item::Column::Fingerprint)
        .filter(entities::playlist_item::Column::PlaylistId.eq(playlist_id))
        .into_tuple::<(String, String)>()
        .all(txn)
        .await
        .wrap_err("Failed to load stored item fingerprints")?;

    Ok(rows.into_iter().collect())
}

async fn insert_playlist(txn: &DatabaseTransaction, playlist: &FetchedPlaylist) -> Result<()> {
    let model = entities::playlist::ActiveModel {
        id: Set(playlist.id.clone()),
        title: Set(playlist.title.clone()),
        channel: Set(playlist.channel.clone()),
        thumbnail: Set(playlist.thumbnail.clone()),
        item_count: Set(playlist.item_count),
        fingerprint: Set(playlist.fingerprint.clone()),
        ..entities::playlist::ActiveModel::new()
    };
    model
        .insert(txn)
        .await
        .wrap_err("Failed to insert playlist")?;
    Ok(())
}

async fn update_playlist(txn: &DatabaseTransaction, playlist: &FetchedPlaylist) -> Result<()> {
    let model = entities::playlist::ActiveModel {
        id: Unchanged(playlist.id.clone()),
        title: Set(playlist.title.clone()),
        channel: Set(playlist.channel.clone()),
        thumbnail: Set(playlist.thumbnail.clone()),
        item_count: Set(playlist.item_count),
        fingerprint: Set(playlist.fingerprint.clone()),
        ..ActiveModelTrait::default()
    };
    model
        .update(txn)
        .await
        .wrap_err("Failed to update playlist")?;
    Ok(())
}

async fn apply_delta(
    txn: &DatabaseTransaction,
    fetched: &HashMap<String, FetchedItem>,
    playlist_id: &str,
    delta: &ItemDelta,
) -> Result<()> {
    for id in &delta.insert {
        let item = &fetched[id];
        let model = entities::playlist_item::ActiveModel {
            playlist_id: Set(playlist_id.to_string()),
            id: Set(item.id.clone()),
            title: Set(item.title.clone()),
            channel: Set(item.channel.clone()),
            thumbnail: Set(item.thumbnail.clone()),
            position: Set(item.position),
            fingerprint: Set(item.fingerprint.clone()),
            ..entities::playlist_item::ActiveModel::new()
        };
        model
            .insert(txn)
            .await
            .wrap_err_with(|| format!("Failed to insert playlist item {id}"))?;
    }

    for id in &delta.update {
        let item = &fetched[id];
        let model = entities::playlist_item::ActiveModel {
            playlist_id: Unchanged(playlist_id.to_string()),
            id: Unchanged(item.id.clone()),
            title: Set(item.title.clone()),
            channel: Set(item.channel.clone()),
            thumbnail: Set(item.thumbnail.clone()),
            position: Set(item.position),
            fingerprint: Set(item.fingerprint.clone()),
            ..ActiveModelTrait::default()
        };
        model
            .update(txn)
            .await
            .wrap_err_with(|| format!("Failed to update playlist item {id}"))?;
    }

    let delete_ids: Vec<&String> = delta.delete.iter().collect();
    for chunk in delete_ids.chunks(DELETE_CHUNK_SIZE) {
        entities::playlist_item::Entity::delete_many()
            .filter(entities::playlist_item::Column::PlaylistId.eq(playlist_id))
            .filter(entities::playlist_item::Column::Id.is_in(chunk.iter().map(|id| id.as_str())))
            .exec(txn)
            .await
            .wrap_err("Failed to delete playlist items")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, QueryOrder};

    use crate::services::playlist::fingerprint::item_fingerprint;
    use crate::test_utils::test_db;

    const PLAYLIST_ID: &str = "PLreconcile";

    fn playlist(title: &str) -> FetchedPlaylist {
        FetchedPlaylist {
            id: PLAYLIST_ID.to_string(),
            title: title.to_string(),
            channel: "Channel".to_string(),
            thumbnail: "https://img/p.jpg".to_string(),
            item_count: 2,
            fingerprint: format!("playlist-{title}"),
        }
    }

    fn item(id: &str, fingerprint: &str) -> FetchedItem {
        FetchedItem {
            id: id.to_string(),
            playlist_id: PLAYLIST_ID.to_string(),
            title: format!("Video {id}"),
            channel: "Channel".to_string(),
            thumbnail: format!("https://img/{id}.jpg"),
            position: 0,
            fingerprint: fingerprint.to_string(),
        }
    }

    fn snapshot(items: Vec<FetchedItem>) -> PlaylistSnapshot {
        PlaylistSnapshot {
            playlist: playlist("Mix"),
            items,
        }
    }

    fn stored(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(id, fp)| (id.to_string(), fp.to_string()))
            .collect()
    }

    fn ids(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    async fn stored_items(db: &DatabaseConnection) -> Vec<entities::playlist_item::Model> {
        entities::playlist_item::Entity::find()
            .filter(entities::playlist_item::Column::PlaylistId.eq(PLAYLIST_ID))
            .order_by_asc(entities::playlist_item::Column::Id)
            .all(db)
            .await
            .unwrap()
    }

    async fn stored_fingerprints(db: &DatabaseConnection) -> HashMap<String, String> {
        stored_items(db)
            .await
            .into_iter()
            .map(|i| (i.id, i.fingerprint))
            .collect()
    }

    // ---- ItemDelta ----

    #[test]
    fn test_delta_insert_delete_unchanged() {
        let fetched = index_items(vec![item("A", "fp1"), item("C", "fp3")]);
        let delta = ItemDelta::compute(&fetched, &stored(&[("A", "fp1"), ("B", "fp2")]));

        assert_eq!(delta.insert, ids(&["C"]));
        assert!(delta.update.is_empty());
        assert_eq!(delta.delete, ids(&["B"]));
        assert_eq!(delta.unchanged, ids(&["A"]));
        assert_eq!(delta.comparisons, 1);
    }

    #[test]
    fn test_delta_fingerprint_mismatch_is_update() {
        let fetched = index_items(vec![item("A", "fp2")]);
        let delta = ItemDelta::compute(&fetched, &stored(&[("A", "fp1")]));

        assert!(delta.insert.is_empty());
        assert_eq!(delta.update, ids(&["A"]));
        assert!(delta.delete.is_empty());
    }

    #[test]
    fn test_delta_against_empty_store_inserts_all() {
        let fetched = index_items(vec![item("A", "fp1"), item("B", "fp2")]);
        let delta = ItemDelta::compute(&fetched, &HashMap::new());

        assert_eq!(delta.insert, ids(&["A", "B"]));
        assert_eq!(delta.comparisons, 0);
    }

    #[test]
    fn test_delta_partitions_both_sides() {
        let fetched = index_items(vec![
            item("keep", "same"),
            item("change", "new"),
            item("add", "x"),
        ]);
        let stored = stored(&[("keep", "same"), ("change", "old"), ("drop", "y")]);
        let delta = ItemDelta::compute(&fetched, &stored);

        let fetched_side: BTreeSet<_> = delta
            .insert
            .union(&delta.update)
            .chain(delta.unchanged.iter())
            .cloned()
            .collect();
        let stored_side: BTreeSet<_> = delta
            .update
            .union(&delta.unchanged)
            .chain(delta.delete.iter())
            .cloned()
            .collect();

        assert_eq!(fetched_side, fetched.keys().cloned().collect::<BTreeSet<_>>());
        assert_eq!(stored_side, stored.keys().cloned().collect::<BTreeSet<_>>());
        assert!(delta.insert.is_disjoint(&delta.update));
        assert!(delta.insert.is_disjoint(&delta.delete));
        assert!(delta.update.is_disjoint(&delta.delete));
    }

    #[test]
    fn test_duplicate_fetched_ids_keep_last() {
        let fetched = index_items(vec![item("A", "first"), item("A", "second")]);

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched["A"].fingerprint, "second");
    }

    // ---- reconcile ----

    #[tokio::test]
    async fn test_first_sync_inserts_everything() {
        let db = test_db().await;

        let report = reconcile(&db.conn, snapshot(vec![item("A", "fp1"), item("B", "fp2")]))
            .await
            .unwrap();

        assert!(report.created);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.comparisons, 0);
        assert_eq!(
            stored_fingerprints(&db.conn).await,
            stored(&[("A", "fp1"), ("B", "fp2")])
        );

        let saved = entities::playlist::Entity::find_by_id(PLAYLIST_ID.to_string())
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.title, "Mix");
        assert_eq!(saved.fingerprint, "playlist-Mix");
    }

    #[tokio::test]
    async fn test_insert_and_delete_scenario() {
        let db = test_db().await;
        reconcile(&db.conn, snapshot(vec![item("A", "fp1"), item("B", "fp2")]))
            .await
            .unwrap();

        let report = reconcile(&db.conn, snapshot(vec![item("A", "fp1"), item("C", "fp3")]))
            .await
            .unwrap();

        assert!(!report.created);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(
            stored_fingerprints(&db.conn).await,
            stored(&[("A", "fp1"), ("C", "fp3")])
        );
    }

    #[tokio::test]
    async fn test_fingerprint_change_updates_row() {
        let db = test_db().await;
        reconcile(&db.conn, snapshot(vec![item("A", "fp1")]))
            .await
            .unwrap();

        let mut changed = item("A", "fp2");
        changed.title = "Renamed".to_string();
        let report = reconcile(&db.conn, snapshot(vec![changed])).await.unwrap();

        assert_eq!(report.inserted, 0);
        assert_eq!(report.updated, 1);
        assert_eq!(report.deleted, 0);
        let items = stored_items(&db.conn).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].fingerprint, "fp2");
        assert_eq!(items[0].title, "Renamed");
    }

    #[tokio::test]
    async fn test_unrelated_field_change_is_ignored() {
        let db = test_db().await;
        let original = item("A", &item_fingerprint("Video A", "https://img/A.jpg", 0));
        reconcile(&db.conn, snapshot(vec![original.clone()]))
            .await
            .unwrap();

        // Channel is not part of the fingerprint.
        let mut renamed_channel = original;
        renamed_channel.channel = "Someone else".to_string();
        let report = reconcile(&db.conn, snapshot(vec![renamed_channel]))
            .await
            .unwrap();

        assert_eq!(report.updated, 0);
        assert_eq!(report.unchanged, 1);
        assert_eq!(stored_items(&db.conn).await[0].channel, "Channel");
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let db = test_db().await;
        let items = vec![item("A", "fp1"), item("B", "fp2")];
        reconcile(&db.conn, snapshot(items.clone())).await.unwrap();
        let before = stored_items(&db.conn).await;

        let report = reconcile(&db.conn, snapshot(items)).await.unwrap();

        assert_eq!(report.inserted + report.updated + report.deleted, 0);
        assert_eq!(report.unchanged, 2);
        assert_eq!(stored_items(&db.conn).await, before);
    }

    #[tokio::test]
    async fn test_playlist_fields_updated_on_refresh() {
        let db = test_db().await;
        reconcile(&db.conn, snapshot(vec![item("A", "fp1")]))
            .await
            .unwrap();

        let renamed = PlaylistSnapshot {
            playlist: playlist("Renamed mix"),
            items: vec![item("A", "fp1")],
        };
        reconcile(&db.conn, renamed).await.unwrap();

        let saved = entities::playlist::Entity::find_by_id(PLAYLIST_ID.to_string())
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.title, "Renamed mix");
        assert_eq!(saved.fingerprint, "playlist-Renamed mix");
    }

    #[tokio::test]
    async fn test_unreadable_items_skip_run() {
        let db = test_db().await;
        reconcile(&db.conn, snapshot(vec![item("A", "fp1")]))
            .await
            .unwrap();
        db.conn
            .execute_unprepared("ALTER TABLE playlist_item RENAME TO playlist_item_gone")
            .await
            .unwrap();

        let renamed = PlaylistSnapshot {
            playlist: playlist("Renamed mix"),
            items: vec![item("B", "fp2")],
        };
        let report = reconcile(&db.conn, renamed).await.unwrap();

        assert!(report.skipped);
        let saved = entities::playlist::Entity::find_by_id(PLAYLIST_ID.to_string())
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.title, "Mix");
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_run() {
        let db = test_db().await;
        reconcile(&db.conn, snapshot(vec![item("A", "fp1")]))
            .await
            .unwrap();
        db.conn
            .execute_unprepared(
                "CREATE TRIGGER reject_boom BEFORE INSERT ON playlist_item \
                 WHEN NEW.id = 'boom' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            )
            .await
            .unwrap();

        let result = reconcile(
            &db.conn,
            PlaylistSnapshot {
                playlist: playlist("Renamed mix"),
                items: vec![item("A", "fp2"), item("boom", "fp9")],
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(
            stored_fingerprints(&db.conn).await,
            stored(&[("A", "fp1")])
        );
        let saved = entities::playlist::Entity::find_by_id(PLAYLIST_ID.to_string())
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.title, "Mix");
    }

    #[tokio::test]
    async fn test_same_video_in_two_playlists() {
        let db = test_db().await;
        reconcile(&db.conn, snapshot(vec![item("A", "fp1")]))
            .await
            .unwrap();

        let mut other_item = item("A", "fp1");
        other_item.playlist_id = "PLother".to_string();
        let mut other_playlist = playlist("Other");
        other_playlist.id = "PLother".to_string();
        let report = reconcile(
            &db.conn,
            PlaylistSnapshot {
                playlist: other_playlist,
                items: vec![other_item],
            },
        )
        .await
        .unwrap();

        assert!(report.created);
        assert_eq!(report.inserted, 1);
        assert_eq!(stored_items(&db.conn).await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let db = test_db().await;
        reconcile(&db.conn, snapshot(vec![item("A", "fp1")]))
            .await
            .unwrap();
        let playlist_before = entities::playlist::Entity::find_by_id(PLAYLIST_ID.to_string())
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        let item_before = stored_items(&db.conn).await.remove(0);

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let report = reconcile(
            &db.conn,
            PlaylistSnapshot {
                playlist: playlist("Renamed"),
                items: vec![item("A", "fp2")],
            },
        )
        .await
        .unwrap();
        assert_eq!(report.updated, 1);

        let playlist_after = entities::playlist::Entity::find_by_id(PLAYLIST_ID.to_string())
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        let item_after = stored_items(&db.conn).await.remove(0);

        assert_eq!(playlist_after.title, "Renamed");
        assert_eq!(playlist_after.created_at, playlist_before.created_at);
        assert!(playlist_after.updated_at > playlist_before.updated_at);
        assert_eq!(item_after.fingerprint, "fp2");
        assert_eq!(item_after.created_at, item_before.created_at);
        assert!(item_after.updated_at > item_before.updated_at);
    }
}
