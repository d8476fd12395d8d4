/// Marquee Sync Daemon - mirrors remote playlists into the local database
use clap::{Parser, Subcommand};
use marquee_core::{AccountId, PlaylistId};
use marquee_sync::RefreshOutcome;
use marquee_syncd::{build_refresher, DaemonConfig, RefreshWatcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "marquee-syncd")]
#[command(about = "Keeps federated playlists in sync with their origin", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh one playlist if it is stale
    Refresh {
        /// Local playlist id
        id: PlaylistId,
    },
    /// Import a remote playlist by URL
    Import {
        /// Federation URL of the playlist
        url: String,
        /// Account owning the playlist when no channel can be attributed
        #[arg(short, long)]
        owner: AccountId,
    },
    /// Refresh stale playlists periodically until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_syncd=info,marquee_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = DaemonConfig::load(cli.config.as_deref())?;
    config.validate()?;

    // Initialize database
    let pool =
        marquee_storage::create_pool_with(&config.database.url, config.database.max_connections)
            .await?;
    marquee_storage::run_migrations(&pool).await?;
    tracing::info!(url = %config.database.url, "Database connected");

    let refresher = build_refresher(&config, pool)?;

    match cli.command {
        Commands::Refresh { id } => match refresher.refresh_if_needed(id).await? {
            RefreshOutcome::Unchanged(playlist) => {
                println!("{} unchanged ({})", playlist.id, playlist.url);
            }
            RefreshOutcome::Refreshed(playlist) => {
                println!("{} refreshed ({})", playlist.id, playlist.url);
            }
            RefreshOutcome::Deleted { id, url } => {
                println!("{id} deleted, {url} is gone");
            }
        },
        Commands::Import { url, owner } => {
            let playlist = refresher.fetch_remote_playlist(&url, owner).await?;
            println!("{} imported: {} ({})", playlist.id, playlist.name, playlist.url);
        }
        Commands::Watch => {
            let watcher = RefreshWatcher::new(Arc::new(refresher), &config.watch);
            tokio::select! {
                () = watcher.run() => {}
                result = tokio::signal::ctrl_c() => {
                    result?;
                    tracing::info!("Interrupted, shutting down");
                }
            }
        }
    }

    Ok(())
}
