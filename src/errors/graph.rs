//! Graph store error types

use thiserror::Error;

/// Errors raised by the property graph store
#[derive(Error, Debug)]
pub enum GraphError {
    /// No node carries the given element id
    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    /// A label that cannot be used as a node label
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// The store rejected or failed a query
    #[error("Query failed: {0}")]
    QueryFailed(String),
}
