use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use walletwatch::api::{self, AppState};
use walletwatch::auth::TokenManager;
use walletwatch::config::Config;
use walletwatch::db::challenges;
use walletwatch::entity::watchlist::WatchlistStore;
use walletwatch::pipeline::AnalysisPipeline;

/// How often stale auth challenges are swept from the database.
const CHALLENGE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=info for output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("WalletWatch starting");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;
    tracing::info!(
        network = %config.network.name,
        "Configuration loaded from {}",
        config_path
    );

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| eyre::eyre!("Failed to connect to database: {}", e))?;

    tracing::info!("Connected to PostgreSQL");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| eyre::eyre!("Failed to run migrations: {}", e))?;

    tracing::info!("Database migrations complete");

    // Load the flagged-entity watchlist, if configured
    let watchlist = match config.watchlist.path {
        Some(ref path) => match WatchlistStore::load_csv(path) {
            Ok(store) => {
                tracing::info!(path = %path, "Watchlist loaded");
                store
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load watchlist, continuing without");
                WatchlistStore::empty()
            }
        },
        None => WatchlistStore::empty(),
    };

    let pipeline = Arc::new(AnalysisPipeline::new(&config, watchlist)?);
    let state = AppState {
        pool: pool.clone(),
        pipeline,
        tokens: TokenManager::new(&config.auth),
        auth: config.auth.clone(),
    };

    // Create shutdown signal
    let shutdown = CancellationToken::new();

    // Sweep expired auth challenges in the background
    let purge_handle = {
        let pool = pool.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CHALLENGE_PURGE_INTERVAL);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        match challenges::purge_expired(&pool).await {
                            Ok(0) => {}
                            Ok(n) => tracing::debug!(purged = n, "Expired challenges removed"),
                            Err(e) => tracing::warn!(error = %e, "Challenge purge failed"),
                        }
                    }
                }
            }
        })
    };

    // Spawn API server
    if config.api.enabled {
        let api_config = config.api.clone();
        tokio::spawn(async move {
            if let Err(e) = api::serve(state, &api_config).await {
                tracing::error!(error = %e, "API server failed");
            }
        });
    }

    tracing::info!("WalletWatch started. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping...");
    shutdown.cancel();
    let _ = purge_handle.await;

    tracing::info!("WalletWatch stopped gracefully");
    Ok(())
}
