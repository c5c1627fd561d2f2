pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod records;
pub mod service;
pub mod state;
pub mod store;

pub use app::build_router;
