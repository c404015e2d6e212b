//! LogStream Core - Changelog Service Backend
//!
//! Projects, posts and webhook notifications behind a JWT-authenticated REST
//! API, with paginated listings served by a shared query engine.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod query;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
