use axum::extract::State;
use tracing::info;

use crate::server::app::AppState;
use crate::server::problem::Problem;

/// Replaces the graph contents with a fresh import of the Backstage catalog.
pub async fn import_catalog(State(state): State<AppState>) -> Result<String, Problem> {
    let production = state.is_production();

    state
        .catalog
        .reset()
        .await
        .map_err(|e| Problem::from_catalog_error(&e, production))?;

    info!("Importing Backstage Catalog ...");
    let count = state
        .importer
        .import_backstage_catalog()
        .await
        .map_err(|e| Problem::from_catalog_error(&e, production))?;
    info!("Successfully imported Backstage Catalog.");

    Ok(format!(
        "Importing Backstage Catalog ...\nSuccessfully imported Backstage Catalog ({} entities).",
        count
    ))
}
