pub mod diagram_service;
pub mod render_service;

pub use diagram_service::*;
pub use render_service::*;
