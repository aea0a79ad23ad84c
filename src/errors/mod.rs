//! Domain-specific error types for c4stage
//!
//! # Error Categories
//!
//! - **GraphError**: graph store lookups and mutations
//! - **DiagramError**: diagram queries, rendering and delivery
//! - **CatalogError**: catalog parsing, import and persistence
//!
//! ```rust
//! use c4stage::errors::{DiagramError, GraphError};
//!
//! let err = DiagramError::NotFound("billing".to_string());
//! assert!(err.is_not_found());
//!
//! let err: DiagramError = GraphError::NodeNotFound("4:abc:1".to_string()).into();
//! assert!(!err.is_not_found());
//! ```

pub mod catalog;
pub mod diagram;
pub mod graph;

pub use catalog::CatalogError;
pub use diagram::DiagramError;
pub use graph::GraphError;

/// Result type alias for graph store operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for diagram operations
pub type DiagramResult<T> = Result<T, DiagramError>;

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
