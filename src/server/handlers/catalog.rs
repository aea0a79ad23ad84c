use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Serialize;

use crate::catalog::{Page, PageParams, System};
use crate::server::app::AppState;
use crate::server::problem::Problem;

#[derive(Serialize, Debug)]
pub struct SystemsResponse {
    pub data: Vec<System>,
    pub page: Page,
}

pub async fn list_systems(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<SystemsResponse>, Problem> {
    let (data, page) = state
        .catalog
        .find_systems(params)
        .await
        .map_err(|e| Problem::from_catalog_error(&e, state.is_production()))?;

    Ok(Json(SystemsResponse { data, page }))
}
