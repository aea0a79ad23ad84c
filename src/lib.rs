pub mod backstage;
pub mod c4;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod graph_store;

pub mod server;
pub mod services;
