use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::model::C4DiagramModel;
use super::reader::{classify, DecodedElement};
use super::tables::DiagramTables;
use crate::errors::DiagramResult;
use crate::graph_store::{GraphStore, Row, REL_CONTAINS};

/// Builds diagram models from graph queries.
#[async_trait]
pub trait C4Repository: Send + Sync {
    /// Every system and every system-to-system relation.
    async fn system_landscape_diagram(&self) -> DiagramResult<C4DiagramModel>;

    /// Every system with its components, wired by component dependencies.
    async fn system_landscape_container_diagram(&self) -> DiagramResult<C4DiagramModel>;

    /// The components of the system named `name` and everything they talk to.
    async fn container_diagram(&self, name: &str) -> DiagramResult<C4DiagramModel>;
}

pub struct GraphC4Repository<S: GraphStore> {
    store: Arc<S>,
    tables: Arc<DiagramTables>,
}

impl<S: GraphStore> GraphC4Repository<S> {
    pub fn new(store: Arc<S>, tables: Arc<DiagramTables>) -> Self {
        Self { store, tables }
    }

    fn decode(&self, rows: &[Row]) -> Vec<DecodedElement> {
        rows.iter()
            .flatten()
            .map(|value| classify(value, &self.tables))
            .collect()
    }
}

#[async_trait]
impl<S: GraphStore> C4Repository for GraphC4Repository<S> {
    async fn system_landscape_diagram(&self) -> DiagramResult<C4DiagramModel> {
        let rows = self.store.system_landscape().await?;
        debug!("System landscape query returned {} rows", rows.len());

        let mut model = C4DiagramModel::new();
        for element in self.decode(&rows) {
            match element {
                DecodedElement::System(system) => model.add_system(system),
                DecodedElement::Relation { relation, .. } => model.add_relation(relation),
                // Only systems take part in the context view.
                DecodedElement::Container(_) | DecodedElement::Unrecognized => {}
            }
        }

        Ok(model)
    }

    async fn system_landscape_container_diagram(&self) -> DiagramResult<C4DiagramModel> {
        let rows = self.store.system_landscape_containers().await?;
        debug!("Landscape container query returned {} rows", rows.len());

        let mut model = C4DiagramModel::new();
        for element in self.decode(&rows) {
            match element {
                DecodedElement::System(system) => model.add_system(system),
                DecodedElement::Container(container) => model.add_container(container),
                DecodedElement::Relation { relation, rel_type } => {
                    if rel_type != REL_CONTAINS {
                        model.add_relation(relation);
                    }
                }
                DecodedElement::Unrecognized => {}
            }
        }

        model.post_process();
        Ok(model)
    }

    async fn container_diagram(&self, name: &str) -> DiagramResult<C4DiagramModel> {
        let rows = self.store.system_containers(name).await?;
        debug!("Container query for {} returned {} rows", name, rows.len());

        let mut model = C4DiagramModel::new();
        for element in self.decode(&rows) {
            match element {
                DecodedElement::System(system) if system.label == name => model.add_system(system),
                DecodedElement::System(system) => model.add_external_system(system),
                DecodedElement::Container(container) => model.add_container(container),
                DecodedElement::Relation { relation, rel_type } => {
                    if rel_type != REL_CONTAINS {
                        model.add_relation(relation);
                    }
                }
                DecodedElement::Unrecognized => {}
            }
        }

        model.post_process();
        Ok(model)
    }
}
