use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::c4::delivery::{Delivered, OutputFormat, PlantUmlClient};
use crate::c4::model::C4DiagramModel;
use crate::c4::plantuml::{DiagramView, PlantUmlExporter};
use crate::c4::repository::C4Repository;
use crate::errors::{DiagramError, DiagramResult};

/// Which diagram a request is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramKind {
    Context,
    LandscapeContainer,
    SystemContainer(String),
}

impl DiagramKind {
    pub fn view(&self) -> DiagramView {
        match self {
            DiagramKind::Context => DiagramView::Context,
            DiagramKind::LandscapeContainer | DiagramKind::SystemContainer(_) => {
                DiagramView::Container
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiagramRequest {
    pub kind: DiagramKind,
    pub scale: f64,
    pub format: OutputFormat,
}

impl DiagramRequest {
    /// Builds a request from raw query values. A scale that does not parse counts as `0`.
    pub fn from_query(kind: DiagramKind, scale: Option<&str>, format: Option<&str>) -> Self {
        Self {
            kind,
            scale: parse_scale(scale),
            format: OutputFormat::from_query(format),
        }
    }
}

pub fn parse_scale(scale: Option<&str>) -> f64 {
    scale
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|s| s.is_finite())
        .unwrap_or(0.0)
}

/// Query, render and deliver pipeline behind the diagram endpoints.
pub struct DiagramService {
    repository: Arc<dyn C4Repository>,
    exporter: Arc<PlantUmlExporter>,
    plantuml: PlantUmlClient,
}

impl DiagramService {
    pub fn new(
        repository: Arc<dyn C4Repository>,
        exporter: Arc<PlantUmlExporter>,
        plantuml: PlantUmlClient,
    ) -> Self {
        Self {
            repository,
            exporter,
            plantuml,
        }
    }

    /// Loads the model for `kind`, giving up as soon as `cancel` fires.
    ///
    /// A named system whose model comes back empty is reported as not found.
    pub async fn model(
        &self,
        kind: &DiagramKind,
        cancel: &CancellationToken,
    ) -> DiagramResult<C4DiagramModel> {
        let query = async {
            match kind {
                DiagramKind::Context => self.repository.system_landscape_diagram().await,
                DiagramKind::LandscapeContainer => {
                    self.repository.system_landscape_container_diagram().await
                }
                DiagramKind::SystemContainer(name) => self.repository.container_diagram(name).await,
            }
        };

        let model = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DiagramError::Cancelled),
            model = query => model?,
        };

        if let DiagramKind::SystemContainer(name) = kind {
            if model.is_empty() {
                return Err(DiagramError::NotFound(name.clone()));
            }
        }

        Ok(model)
    }

    pub fn render(&self, kind: &DiagramKind, model: &C4DiagramModel) -> DiagramResult<String> {
        self.exporter.render(kind.view(), model)
    }

    pub async fn diagram(
        &self,
        request: &DiagramRequest,
        cancel: &CancellationToken,
    ) -> DiagramResult<Delivered> {
        let mut model = self.model(&request.kind, cancel).await?;
        model.scale = request.scale;

        let puml = self.render(&request.kind, &model)?;
        debug!(
            "Rendered {:?} diagram: {} systems, {} containers, {} relations",
            request.kind,
            model.systems.len(),
            model.containers.len(),
            model.relations.len()
        );

        let delivered = self.plantuml.deliver(puml, request.format).await?;
        info!("Delivered {:?} diagram as {}", request.kind, request.format.as_str());
        Ok(delivered)
    }
}
