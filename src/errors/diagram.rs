//! Diagram pipeline error types
//!
//! Covers every way a diagram request can fail after routing: the graph query,
//! the named-system lookup, template rendering and forwarding to PlantUML.

use thiserror::Error;

use super::GraphError;

/// Diagram query, rendering and delivery errors
#[derive(Error, Debug)]
pub enum DiagramError {
    /// Graph query failed
    #[error("Graph query failed: {0}")]
    Query(#[from] GraphError),

    /// The named system has no diagram content
    #[error("system {0} not found")]
    NotFound(String),

    /// A diagram template failed to compile
    #[error("Invalid template: {0}")]
    Template(#[from] handlebars::TemplateError),

    /// Rendering into the output sink failed
    #[error("Rendering failed: {0}")]
    Render(#[from] handlebars::RenderError),

    /// The PlantUML server could not be reached or answered with an error
    #[error("PlantUML request failed: {0}")]
    Delivery(#[from] reqwest::Error),

    /// The caller gave up before the graph query finished
    #[error("Diagram request cancelled")]
    Cancelled,
}

impl DiagramError {
    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiagramError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let err = DiagramError::NotFound("billing".to_string());
        assert_eq!(err.to_string(), "system billing not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_query_error_is_internal() {
        let err = DiagramError::from(GraphError::QueryFailed("boom".to_string()));
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Graph query failed: Query failed: boom");
    }

    #[test]
    fn test_cancelled() {
        let err = DiagramError::Cancelled;
        assert_eq!(err.to_string(), "Diagram request cancelled");
        assert!(!err.is_not_found());
    }
}
