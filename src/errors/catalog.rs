//! Catalog import and persistence error types
//!
//! ```rust
//! use c4stage::errors::CatalogError;
//!
//! let err = CatalogError::UnknownDependsOn("team".to_string());
//! assert!(err.is_client_error());
//! ```

use thiserror::Error;

use super::GraphError;

/// Catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Dependency reference with a kind prefix outside the whitelist
    #[error("unknown depends on {0}")]
    UnknownDependsOn(String),

    /// Entity kind that cannot be represented in the catalog
    #[error("could not convert kind {0}")]
    UnsupportedKind(String),

    /// Component type other than service or database
    #[error("could not convert component of type {0}")]
    UnsupportedComponentType(String),

    /// Fetching the Backstage catalog failed
    #[error("Catalog fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// YAML parsing error
    #[error("document decode failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid file glob pattern
    #[error("Invalid catalog path: {0}")]
    Pattern(#[from] glob::PatternError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Graph store error
    #[error("Graph store error: {0}")]
    Graph(#[from] GraphError),
}

impl CatalogError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::UnknownDependsOn(_)
                | CatalogError::UnsupportedKind(_)
                | CatalogError::UnsupportedComponentType(_)
                | CatalogError::Yaml(_)
        )
    }
}
