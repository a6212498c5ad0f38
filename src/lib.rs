pub mod cluster;
pub mod error;
pub mod store;
pub mod ui;
