//! The software catalog: systems, their components and the APIs between them,
//! persisted as nodes and relationships of the architecture graph.

pub mod domain;
pub mod paged;
pub mod repository;

pub use domain::{Api, CatalogEntity, Container, DependsOn, EntityEnvelope, System};
pub use paged::{Page, PageParams};
pub use repository::{CatalogRepository, GraphCatalogRepository};
