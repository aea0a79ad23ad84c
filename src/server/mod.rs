pub mod app;
pub mod handlers;
pub mod problem;

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::graph_store::InMemoryGraph;
use app::AppState;

pub async fn start_server(config: Config) -> Result<()> {
    let port = config.port;
    let cors_origin = config.cors_origin.clone();

    let graph = Arc::new(InMemoryGraph::new());
    let state = AppState::new(config, graph)?;
    state.catalog.reset().await?;

    schedule_backstage_import(&state);

    let app = app::create_app(state.clone(), cors_origin.as_deref())?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.shutdown.clone()))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Runs the Backstage import once the configured delay has passed, unless the
/// server shuts down first.
fn schedule_backstage_import(state: &AppState) {
    let Some(delay) = state.config.import_delay() else {
        info!("Backstage import on startup is disabled");
        return;
    };

    info!("Importing Backstage Catalog in {} seconds.", delay.as_secs());
    let importer = state.importer.clone();
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        info!("Importing Backstage Catalog ...");
        match importer.import_backstage_catalog().await {
            Ok(count) => info!("Successfully imported Backstage Catalog ({} entities).", count),
            Err(e) => error!("Backstage import failed: {}", e),
        }
    });
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
    shutdown.cancel();
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                     - Health check");
    info!("  /api/version                - Build information");
    info!("  /api/c4/context             - System context diagram");
    info!("  /api/c4/container           - Landscape container diagram");
    info!("  /api/c4/:name/container     - Container diagram of one system");
    info!("  /api/catalog                - Internal systems");
    info!("  /api/backstage/import       - Re-import the Backstage catalog");
}
