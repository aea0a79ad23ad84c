use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::diagram_service::{DiagramKind, DiagramRequest, DiagramService};
use crate::backstage::BackstageImporter;
use crate::c4::{DiagramTables, GraphC4Repository, OutputFormat, PlantUmlClient, PlantUmlExporter};
use crate::catalog::{CatalogRepository, GraphCatalogRepository};
use crate::graph_store::InMemoryGraph;

/// Offline rendering of a catalog checked out on disk.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub catalog_dir: PathBuf,
    pub kind: DiagramKind,
    pub scale: f64,
    pub format: OutputFormat,
    pub plantuml_server: String,
}

/// Loads every `catalog-info.yaml` below the catalog directory into a private graph
/// and renders one diagram of it.
pub async fn render_catalog(options: &RenderOptions) -> Result<Vec<u8>> {
    let graph = Arc::new(InMemoryGraph::new());
    let catalog: Arc<dyn CatalogRepository> = Arc::new(GraphCatalogRepository::new(graph.clone()));

    // Offline: the importer never contacts a Backstage server here.
    let count = BackstageImporter::new(String::new(), catalog)
        .import_yaml_files(&options.catalog_dir)
        .await?;
    info!("Loaded {} entities from {}", count, options.catalog_dir.display());

    let tables = Arc::new(DiagramTables::default());
    let service = DiagramService::new(
        Arc::new(GraphC4Repository::new(graph, tables.clone())),
        Arc::new(PlantUmlExporter::new(tables)?),
        PlantUmlClient::new(options.plantuml_server.clone()),
    );

    let request = DiagramRequest {
        kind: options.kind.clone(),
        scale: options.scale,
        format: options.format,
    };
    let delivered = service.diagram(&request, &CancellationToken::new()).await?;
    Ok(delivered.into_bytes())
}
