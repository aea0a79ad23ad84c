//! Import of Backstage catalog entities, from a running Backstage instance or
//! from `catalog-info.yaml` files on disk.

pub mod entities;
pub mod importer;

pub use entities::RawEntity;
pub use importer::BackstageImporter;
