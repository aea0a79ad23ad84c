pub mod backstage;
pub mod c4;
pub mod catalog;
pub mod health;
pub mod version;
