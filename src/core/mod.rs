//! Core functionality for the relay server.
//!
//! This module contains fundamental components used throughout the application:
//! - Configuration management
//! - Error handling
//! - Logging context
//! - Metrics collection
//! - HTTP middleware
//! - Stream cancellation tracking

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod middleware;

// Re-export commonly used types
pub use cancel::{StreamCancelHandle, StreamOutcome};
pub use config::{AppConfig, GeminiConfig, ServerConfig};
pub use error::{AppError, ProviderError, Result};
pub use logging::{get_request_id, get_session_id};
pub use metrics::{get_metrics, init_metrics, Metrics};
pub use middleware::{request_id_middleware, MetricsMiddleware};
