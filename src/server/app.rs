use anyhow::Result;
use axum::{http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{backstage, c4, catalog, health, version};
use crate::backstage::BackstageImporter;
use crate::c4::{DiagramTables, GraphC4Repository, PlantUmlClient, PlantUmlExporter};
use crate::catalog::{CatalogRepository, GraphCatalogRepository};
use crate::config::Config;
use crate::graph_store::InMemoryGraph;
use crate::services::DiagramService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub diagrams: Arc<DiagramService>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub importer: BackstageImporter,
    /// Cancelled on shutdown; in-flight graph queries give up.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wires repositories, exporter and clients around a shared graph.
    ///
    /// Fails when the diagram templates do not compile.
    pub fn new(config: Config, graph: Arc<InMemoryGraph>) -> Result<Self> {
        let tables = Arc::new(DiagramTables::default());
        let exporter = Arc::new(PlantUmlExporter::new(tables.clone())?);
        let c4_repository = Arc::new(GraphC4Repository::new(graph.clone(), tables));
        let catalog: Arc<dyn CatalogRepository> = Arc::new(GraphCatalogRepository::new(graph));

        let diagrams = DiagramService::new(
            c4_repository,
            exporter,
            PlantUmlClient::new(config.plantuml_server.clone()),
        );
        let importer = BackstageImporter::new(config.backstage_server.clone(), catalog.clone());

        Ok(Self {
            config: Arc::new(config),
            diagrams: Arc::new(diagrams),
            catalog,
            importer,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}

pub fn create_app(state: AppState, cors_origin: Option<&str>) -> Result<Router> {
    let routes = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes());

    Ok(with_middleware(routes, cors_layer(cors_origin)?).with_state(state))
}

fn cors_layer(cors_origin: Option<&str>) -> Result<CorsLayer> {
    let origin = match cors_origin.filter(|origin| *origin != "*") {
        Some(origin) => AllowOrigin::exact(origin.parse::<HeaderValue>()?),
        None => AllowOrigin::any(),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Tracing, panic recovery, gzip and CORS around every route.
fn with_middleware(routes: Router<AppState>, cors: CorsLayer) -> Router<AppState> {
    routes.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::new())
            .layer(CompressionLayer::new())
            .layer(cors),
    )
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/version", get(version::get_version))
        // Diagrams
        .route("/c4/context", get(c4::context_diagram))
        .route("/c4/container", get(c4::landscape_container_diagram))
        .route("/c4/:name/container", get(c4::system_container_diagram))
        // Catalog
        .route("/catalog", get(catalog::list_systems))
        .route("/backstage/import", get(backstage::import_catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderName, StatusCode};
    use axum_test::TestServer;

    async fn explode() -> &'static str {
        panic!("handler exploded")
    }

    fn state() -> AppState {
        AppState::new(Config::default(), Arc::new(InMemoryGraph::new())).unwrap()
    }

    #[tokio::test]
    async fn handler_panic_becomes_internal_server_error() {
        let routes: Router<AppState> = Router::new().route("/boom", get(explode));
        let app = with_middleware(routes, cors_layer(None).unwrap()).with_state(state());
        let server = TestServer::new(app).unwrap();

        let response = server.get("/boom").await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        // The server keeps serving after a panic.
        let response = server.get("/boom").await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn responses_are_gzipped_on_request() {
        let server = TestServer::new(create_app(state(), None).unwrap()).unwrap();

        let response = server
            .get("/api/c4/context")
            .add_query_param("format", "puml")
            .add_header(
                HeaderName::from_static("accept-encoding"),
                HeaderValue::from_static("gzip"),
            )
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.header(header::CONTENT_ENCODING), "gzip");
    }

    #[test]
    fn cors_origin_must_be_a_header_value() {
        assert!(cors_layer(Some("https://c4.example.com")).is_ok());
        assert!(cors_layer(Some("*")).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
    }
}
