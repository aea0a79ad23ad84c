//! C4 diagram pipeline: graph rows are decoded into a [`model::C4DiagramModel`],
//! rendered to PlantUML and handed back as text or forwarded for rasterization.

pub mod delivery;
pub mod model;
pub mod plantuml;
pub mod reader;
pub mod repository;
pub mod tables;

pub use delivery::{Delivered, OutputFormat, PlantUmlClient};
pub use model::{C4DiagramModel, Container, Relation, System};
pub use plantuml::{DiagramView, PlantUmlExporter};
pub use repository::{C4Repository, GraphC4Repository};
pub use tables::DiagramTables;
