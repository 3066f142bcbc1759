//! Axum HTTP API server.
//!
//! Video submission and status routes backed by the analysis provider, and
//! the edit route that drives the rendition matrix.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::StatusBridge;
pub use state::AppState;
pub use store::{InMemoryVideoStore, VideoStore};
