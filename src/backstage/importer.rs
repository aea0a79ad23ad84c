use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::entities::RawEntity;
use crate::catalog::{CatalogEntity, CatalogRepository};
use crate::errors::CatalogResult;

const CATALOG_QUERY: &str = "api/catalog/entities?offset=0&limit=500&filter=kind=component&filter=kind=system&filter=kind=api";
const CATALOG_FILE: &str = "catalog-info.yaml";

/// Loads Backstage entities and writes them to the catalog.
#[derive(Clone)]
pub struct BackstageImporter {
    client: Client,
    server: String,
    repository: Arc<dyn CatalogRepository>,
}

impl BackstageImporter {
    pub fn new(server: impl Into<String>, repository: Arc<dyn CatalogRepository>) -> Self {
        Self {
            client: Client::new(),
            server: server.into().trim_end_matches('/').to_string(),
            repository,
        }
    }

    pub fn catalog_url(&self) -> String {
        format!("{}/{}", self.server, CATALOG_QUERY)
    }

    /// Imports the live Backstage catalog. Entities that cannot be converted are
    /// skipped; returns the number of entities written.
    pub async fn import_backstage_catalog(&self) -> CatalogResult<usize> {
        let url = self.catalog_url();
        info!("Fetching Backstage catalog from {}", url);

        let raw_entities: Vec<RawEntity> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut entities = Vec::with_capacity(raw_entities.len());
        for raw in raw_entities {
            let name = raw.metadata.name.clone();
            match raw.into_entity() {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("Skipping Backstage entity {}: {}", name, e),
            }
        }

        let count = entities.len();
        self.repository.create_all(entities).await?;
        info!("Imported {} entities from Backstage", count);
        Ok(count)
    }

    /// Imports every `catalog-info.yaml` below `dir`. Any document that fails to
    /// decode or convert aborts the import before the graph is touched.
    pub async fn import_yaml_files(&self, dir: &Path) -> CatalogResult<usize> {
        let entities = read_catalog_files(dir)?;
        let count = entities.len();
        self.repository.create_all(entities).await?;
        info!("Imported {} entities from {}", count, dir.display());
        Ok(count)
    }
}

fn read_catalog_files(dir: &Path) -> CatalogResult<Vec<CatalogEntity>> {
    let pattern = dir.join("**").join(CATALOG_FILE);
    let pattern = pattern.to_string_lossy();

    let mut entities = Vec::new();
    for path in glob::glob(&pattern)?.flatten() {
        debug!("Reading catalog file {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        entities.extend(parse_catalog_documents(&content)?);
    }
    Ok(entities)
}

/// Parses a multi-document YAML stream of Backstage entities.
fn parse_catalog_documents(content: &str) -> CatalogResult<Vec<CatalogEntity>> {
    let mut entities = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let raw = RawEntity::deserialize(document)?;
        entities.push(raw.into_entity()?);
    }
    Ok(entities)
}
