use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table("playlist")
                    .if_not_exists()
                    .col(ColumnDef::new("id").string().not_null().primary_key())
                    .col(ColumnDef::new("title").string().not_null())
                    .col(ColumnDef::new("channel").string().not_null())
                    .col(ColumnDef::new("thumbnail").string().not_null())
                    .col(ColumnDef::new("item_count").big_integer().not_null())
                    .col(ColumnDef::new("fingerprint").string().not_null())
                    .col(ColumnDef::new("created_at").timestamp().not_null())
                    .col(ColumnDef::new("updated_at").timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // A video can sit in several tracked playlists, so items are keyed
        // by (playlist_id, id) rather than the video id alone.
        manager
            .create_table(
                Table::create()
                    .table("playlist_item")
                    .if_not_exists()
                    .col(ColumnDef::new("playlist_id").string().not_null())
                    .col(ColumnDef::new("id").string().not_null())
                    .col(ColumnDef::new("title").string().not_null())
                    .col(ColumnDef::new("channel").string().not_null())
                    .col(ColumnDef::new("thumbnail").string().not_null())
                    .col(ColumnDef::new("position").big_integer().not_null())
                    .col(ColumnDef::new("fingerprint").string().not_null())
                    .col(ColumnDef::new("created_at").timestamp().not_null())
                    .col(ColumnDef::new("updated_at").timestamp().not_null())
                    .primary_key(Index::create().col("playlist_id").col("id"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_item_playlist_id")
                            .from("playlist_item", "playlist_id")
                            .to("playlist", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_playlist_id_fingerprint")
                    .table("playlist")
                    .if_not_exists()
                    .col("id")
                    .col("fingerprint")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_playlist_item_id_fingerprint")
                    .table("playlist_item")
                    .if_not_exists()
                    .col("id")
                    .col("fingerprint")
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table("playlist_item").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("playlist").to_owned())
            .await?;

        Ok(())
    }
}
