//! HTTP request handlers for the relay API.
//!
//! This module contains the chat endpoint, the health check and the
//! Prometheus metrics endpoint.

use crate::api::models::{ChatRequest, HealthResponse};
use crate::api::streaming::relay_body;
use crate::core::logging::{get_request_id, SESSION_ID};
use crate::core::metrics::get_metrics;
use crate::core::middleware::{ModelName, SessionName};
use crate::core::{AppConfig, AppError, Result, StreamCancelHandle};
use crate::services::relay::{ChatRelay, DEFAULT_SESSION_ID};
use crate::services::{ChatProvider, SessionRegistry};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    pub relay: ChatRelay,
}

impl AppState {
    /// Build the state with a fresh, empty session registry.
    pub fn new(config: AppConfig, provider: Arc<dyn ChatProvider>) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let relay = ChatRelay::new(provider, sessions, config.system_prompt.as_str());
        Self { config, relay }
    }
}

/// Relay one chat message and stream the reply as plain text.
#[tracing::instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|rejection| {
        get_metrics()
            .relay_outcomes
            .with_label_values(&["rejected"])
            .inc();
        tracing::debug!(
            request_id = %get_request_id(),
            error = %rejection.body_text(),
            "Rejected chat request body"
        );
        AppError::BadRequest(rejection.body_text())
    })?;

    let session_id = request
        .session_id
        .clone()
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    SESSION_ID
        .scope(session_id, async move {
            tracing::debug!(request_id = %get_request_id(), "Processing chat request");

            let relay = state.relay.open(request).await?;
            let session_id = relay.session_id.clone();
            let model = relay.model.clone();
            let body = relay_body(relay, StreamCancelHandle::new());

            let mut response = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .header(header::CACHE_CONTROL, "no-cache")
                .header("x-content-type-options", "nosniff")
                .body(body)
                .map_err(|e| AppError::Internal(e.to_string()))?;

            response.extensions_mut().insert(ModelName(model));
            response.extensions_mut().insert(SessionName(session_id));
            Ok(response)
        })
        .await
}

/// Basic health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.relay.sessions().len(),
        model: state.relay.model().to_string(),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics_handler() -> Result<Response> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response())
}
