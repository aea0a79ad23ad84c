use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::server::app::AppState;
use crate::server::problem::Problem;
use crate::services::{DiagramKind, DiagramRequest};

#[derive(Deserialize, Debug, Default)]
pub struct DiagramQuery {
    pub scale: Option<String>,
    pub format: Option<String>,
}

pub async fn context_diagram(
    State(state): State<AppState>,
    Query(query): Query<DiagramQuery>,
) -> Result<Response, Problem> {
    diagram(&state, DiagramKind::Context, query).await
}

pub async fn landscape_container_diagram(
    State(state): State<AppState>,
    Query(query): Query<DiagramQuery>,
) -> Result<Response, Problem> {
    diagram(&state, DiagramKind::LandscapeContainer, query).await
}

pub async fn system_container_diagram(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DiagramQuery>,
) -> Result<Response, Problem> {
    diagram(&state, DiagramKind::SystemContainer(name), query).await
}

async fn diagram(state: &AppState, kind: DiagramKind, query: DiagramQuery) -> Result<Response, Problem> {
    let request = DiagramRequest::from_query(kind, query.scale.as_deref(), query.format.as_deref());
    let cancel = state.shutdown.child_token();

    let delivered = state
        .diagrams
        .diagram(&request, &cancel)
        .await
        .map_err(|e| Problem::from_diagram_error(&e, state.is_production()))?;

    let content_type = delivered.content_type();
    Ok(([(header::CONTENT_TYPE, content_type)], delivered.into_bytes()).into_response())
}
