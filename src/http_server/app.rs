use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{
    database::Database,
    http_server::{http_routes::playlists, state::AppState},
    ports::youtube::YoutubeClient,
};

async fn root() -> &'static str {
    "playlist-tracker is running"
}

pub fn router(app_state: Arc<AppState>) -> Router {
    #[cfg(debug_assertions)]
    let cors_layer = CorsLayer::permissive();

    #[cfg(not(debug_assertions))]
    let cors_layer = CorsLayer::new();

    Router::new()
        .route("/", get(root))
        .route(
            "/playlists",
            get(playlists::list_playlists).post(playlists::add_playlist),
        )
        .route("/playlists/refresh", post(playlists::refresh_all_playlists))
        .route(
            "/playlists/{id}",
            get(playlists::get_playlist).delete(playlists::delete_playlist),
        )
        .route("/playlists/{id}/items", get(playlists::get_playlist_items))
        .route("/playlists/{id}/refresh", post(playlists::refresh_playlist))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state)
}

pub async fn start(
    port: u16,
    database: Arc<Database>,
    youtube: Arc<dyn YoutubeClient>,
) -> color_eyre::Result<()> {
    let app = router(Arc::new(AppState {
        db: database,
        youtube,
    }));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", port))?;

    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}
