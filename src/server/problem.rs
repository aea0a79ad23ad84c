use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::{CatalogError, DiagramError};

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Problem details body for failed requests.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Problem {
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: status.as_u16(),
            detail: None,
        }
    }

    pub fn not_found(title: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, title)
    }

    /// An internal server error; the cause is only exposed outside production.
    pub fn internal(err: &dyn std::error::Error, is_production: bool) -> Self {
        error!("internal server error: {}", err);

        let mut problem = Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
        if !is_production {
            problem.detail = Some(err.to_string());
        }
        problem
    }

    pub fn from_diagram_error(err: &DiagramError, is_production: bool) -> Self {
        if err.is_not_found() {
            return Self::not_found(err.to_string());
        }
        Self::internal(err, is_production)
    }

    /// Invalid catalog content is reported as a bad request; everything else is internal.
    pub fn from_catalog_error(err: &CatalogError, is_production: bool) -> Self {
        if err.is_client_error() {
            return Self::new(StatusCode::BAD_REQUEST, err.to_string());
        }
        Self::internal(err, is_production)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)], Json(self)).into_response()
    }
}
