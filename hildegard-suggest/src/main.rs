//! hildegard-suggest - song suggestion wizard service
//!
//! Serves the four-step suggestion wizard over HTTP and appends each
//! confirmed suggestion to the configured spreadsheet. Starts even when the
//! catalog or the credentials are unavailable; see `/health`.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hildegard_common::config::{load_or_default, resolve_config_path};
use tokio::signal;
use tracing::info;

use hildegard_suggest::catalog::{CatalogCache, CatalogLoader};
use hildegard_suggest::config::{Cli, SuggestConfig};
use hildegard_suggest::matcher::select_matcher;
use hildegard_suggest::session::SessionStore;
use hildegard_suggest::store::select_destination;
use hildegard_suggest::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let file = load_or_default(config_path.as_deref());
    let config = SuggestConfig::resolve(&cli, &file.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .init();

    // Build identity goes first so a stuck startup still says what is running
    info!(
        "Starting hildegard-suggest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    file.log();

    let loader = CatalogLoader::from_locations(
        config.catalog_url.as_deref(),
        config.catalog_fallback.clone(),
    );
    let catalog = Arc::new(CatalogCache::new(loader, config.catalog_ttl));
    // Warm the cache so the first user does not wait on the download
    let songs = catalog.get().await;
    info!("Catalog ready: {} songs", songs.len());

    let matcher = select_matcher(config.matcher);
    let destination = select_destination(&config.store);
    let sessions = Arc::new(SessionStore::new(config.session_idle_timeout));

    let state = AppState::new(catalog, matcher, destination, sessions);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!("hildegard-suggest listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
