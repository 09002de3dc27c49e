//! Router assembly.

use crate::api::handlers::{chat, health, metrics_handler, AppState};
use crate::core::{init_metrics, request_id_middleware, MetricsMiddleware};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Build the application router.
///
/// `/` serves `index.html` from the configured static directory and any other
/// unknown path falls back to a file lookup in that directory.
pub fn build_router(state: Arc<AppState>) -> Router {
    init_metrics();

    let static_dir = state.config.static_dir.clone();
    let landing = ServeFile::new(static_dir.join("index.html"));

    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route_service("/", landing)
        .fallback_service(ServeDir::new(static_dir))
        .layer(axum::middleware::from_fn(MetricsMiddleware::track_metrics))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
