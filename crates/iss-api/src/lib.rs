//! HTTP API server for the ISS trajectory service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for querying the epoch store (windowed listing,
//!   exact lookup, speed, nearest-to-now, dataset time range)
//! - **Minimal HTML page** (`GET /`) listing the endpoints
//!
//! # Architecture
//!
//! Every handler goes through the shared [`EpochStore`]. The first
//! request (or the startup warm-up) loads the dataset; all later reads
//! are served from memory. Any store failure becomes an HTTP 500 with a
//! JSON body carrying the failure's message.
//!
//! [`EpochStore`]: iss_core::EpochStore

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use config::{AppConfig, ConfigError, OriginSource};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
