mod config;
mod database;
mod entities;
mod http_server;
mod logging;
mod ports;
mod services;
#[cfg(test)]
mod test_utils;
mod youtube_rs;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};

use crate::{
    config::Config,
    database::Database,
    logging::{init_tracing, shutdown_tracing},
    ports::youtube::YoutubeClient,
    services::playlist::{PlaylistService, SyncOutcome},
    services::youtube::client::YoutubeHttpAdapter,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_TRACKER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Tracing filter, e.g. `info` or `playlist_tracker=debug`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// OTLP gRPC endpoint to export spans to
    #[arg(long, global = true, env = "OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// YouTube Data API key, overrides the config file
    #[arg(short = 'k', long, global = true, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// The port to run the server on, defaults to the config value
        #[arg(short, long, env = "PLAYLIST_TRACKER_HTTP_PORT")]
        port: Option<u16>,
    },
    /// Track a playlist, or refresh it if it is already tracked
    Add {
        /// Playlist URL or id
        input: String,
    },
    /// Refresh every tracked playlist
    RefreshAll,
    /// List tracked playlists
    List,
    /// List the stored items of a playlist
    Items {
        /// Playlist id
        id: String,
    },
    /// Stop tracking a playlist and remove its items
    Delete {
        /// Playlist id
        id: String,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path);
    }

    match Config::config_path() {
        Some(path) if path.exists() => Config::load(),
        _ => {
            log::warn!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn youtube_client(config: &Config, api_key: Option<String>) -> Result<Arc<dyn YoutubeClient>> {
    let api_key = api_key
        .filter(|key| !key.is_empty())
        .or_else(|| config.api_key().map(str::to_string))
        .ok_or_else(|| {
            eyre!("A YouTube API key is required. Set it via --api-key, YOUTUBE_API_KEY or the config file")
        })?;

    Ok(Arc::new(YoutubeHttpAdapter::new(
        config.youtube_base_url()?,
        api_key,
    )))
}

fn print_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::InvalidInput => println!("No playlist id found in input"),
        SyncOutcome::NotFound(id) => println!("Playlist {id} not found or empty"),
        SyncOutcome::Synced(report) if report.skipped => {
            println!("{}: skipped, stored items could not be read", report.playlist_id)
        }
        SyncOutcome::Synced(report) => println!(
            "{}: {} inserted, {} updated, {} deleted, {} unchanged{}",
            report.playlist_id,
            report.inserted,
            report.updated,
            report.deleted,
            report.unchanged,
            if report.created { " (new)" } else { "" },
        ),
    }
}

async fn run(args: Args) -> Result<()> {
    if let Commands::Config(config_commands) = &args.command {
        match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        }
        return Ok(());
    }

    log::debug!("Loading configuration");
    let config =
        load_config(args.config.as_ref()).wrap_err("Failed to load playlist-tracker config")?;

    log::debug!("Opening database at: {}", config.database_path().display());
    let database = Arc::new(Database::open(&config.database_path()).await?);

    match args.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.http_port());
            let youtube = youtube_client(&config, args.api_key)?;
            log::info!("Starting HTTP server on port: {}", port);
            http_server::app::start(port, database, youtube).await?;
        }
        Commands::Add { input } => {
            let service = PlaylistService::new(database, youtube_client(&config, args.api_key)?);
            let outcome = service.add_or_refresh(&input).await?;
            print_outcome(&outcome);
        }
        Commands::RefreshAll => {
            let service = PlaylistService::new(database, youtube_client(&config, args.api_key)?);
            let summary = service.refresh_all().await?;
            for report in summary.synced {
                print_outcome(&SyncOutcome::Synced(report));
            }
            for id in summary.not_found {
                print_outcome(&SyncOutcome::NotFound(id));
            }
            for id in &summary.failed {
                println!("{id}: refresh failed");
            }
            if !summary.failed.is_empty() {
                return Err(eyre!("{} playlist(s) failed to refresh", summary.failed.len()));
            }
        }
        Commands::List => {
            let playlists = PlaylistService::new(database, offline_client())
                .list_playlists()
                .await?;
            for playlist in playlists {
                println!(
                    "{}\t{}\t{}\t{} items",
                    playlist.id, playlist.title, playlist.channel, playlist.item_count
                );
            }
        }
        Commands::Items { id } => {
            let items = PlaylistService::new(database, offline_client())
                .get_items(&id)
                .await?;
            for item in items {
                println!("{}\t{}\t{}", item.position, item.id, item.title);
            }
        }
        Commands::Delete { id } => {
            let deleted = PlaylistService::new(database, offline_client())
                .delete_playlist(&id)
                .await?;
            if deleted {
                println!("Deleted {id}");
            } else {
                println!("Playlist {id} is not tracked");
            }
        }
        Commands::Config(_) => {}
    }

    Ok(())
}

/// Client for commands that only read or delete stored rows.
fn offline_client() -> Arc<dyn YoutubeClient> {
    Arc::new(services::youtube::client::OfflineYoutubeClient)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(args.otlp_endpoint.as_deref(), &args.log_level)?;

    log::debug!("Playlist tracker starting");

    let result = run(args).await;

    shutdown_tracing(tracer_provider);
    result
}
