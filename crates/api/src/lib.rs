//! # Pulse API
//!
//! HTTP surface for ingesting and querying structured log events.
//!
//! - `POST /logs`: validate and store one event
//! - `GET /logs`: filtered, newest-first listing
//! - `GET /health`: liveness

pub mod api;
pub mod config;
pub mod openapi;
pub mod router;
pub mod services;
pub mod telemetry;

pub use config::{ConfigError, LogFormat, ServerConfig, StorageConfig};
pub use router::build_router;
pub use services::LogService;
