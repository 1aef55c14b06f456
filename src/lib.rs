// Library exports for Tawzi
// This allows integration tests and the binary to share the modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod geo;
pub mod notifications;
pub mod points;
pub mod routes;
pub mod shell;
pub mod state;
pub mod storage;
pub mod users;

pub use db::RepositoryError;
