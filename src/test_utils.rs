use std::sync::Arc;

use sea_orm::{ConnectOptions, Database as SeaDatabase};

use crate::database::Database;

pub async fn test_db() -> Arc<Database> {
    // A single connection keeps every query on the same in-memory database.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let conn = SeaDatabase::connect(opt).await.unwrap();

    let db = Database::prepare(conn)
        .await
        .unwrap_or_else(|e| panic!("Failed to prepare test database: {e:?}"));

    Arc::new(db)
}
