//! API layer for the relay server.
//!
//! This module contains the HTTP handlers, request/response models,
//! plain-text streaming of replies, and router assembly.

pub mod disconnect;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod streaming;

// Re-export commonly used types
pub use handlers::{chat, health, metrics_handler, AppState};
pub use models::{ChatRequest, HealthResponse};
pub use routes::build_router;
pub use streaming::relay_body;
