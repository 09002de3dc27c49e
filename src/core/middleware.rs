//! HTTP middleware for request ids and request metrics.

use crate::core::logging::{generate_request_id, REQUEST_ID};
use crate::core::metrics::get_metrics;
use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Header used to accept and echo request ids.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Metric label for requests no route matched (static files and 404s).
pub const FALLBACK_ENDPOINT: &str = "static";

/// Extension type for storing the model name in the response
#[derive(Clone, Debug)]
pub struct ModelName(pub String);

/// Extension type for storing the session id in the response
#[derive(Clone, Debug)]
pub struct SessionName(pub String);

/// Assign a request id to every request.
///
/// An incoming `x-request-id` is reused when it is valid header text; otherwise
/// a fresh UUID is generated. The id is in scope as [`REQUEST_ID`] while the
/// handler runs and is echoed on the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(|v| v.to_string())
        .unwrap_or_else(generate_request_id);

    let mut response = REQUEST_ID
        .scope(request_id.clone(), next.run(request))
        .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Metrics middleware for tracking request statistics.
pub struct MetricsMiddleware;

impl MetricsMiddleware {
    /// Track request count, duration, and active requests.
    ///
    /// For the streaming chat endpoint the duration is time to first byte,
    /// since `next.run()` returns once headers are ready.
    pub async fn track_metrics(request: Request, next: Next) -> Response {
        let path = request.uri().path().to_string();
        let method = request.method().to_string();
        // Route templates only, so arbitrary paths cannot create new series.
        let endpoint = request
            .extensions()
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_string())
            .unwrap_or_else(|| FALLBACK_ENDPOINT.to_string());

        // Skip metrics endpoint itself to avoid recursion
        if endpoint == "/metrics" {
            return next.run(request).await;
        }

        let metrics = get_metrics();
        metrics
            .active_requests
            .with_label_values(&[&endpoint])
            .inc();

        let start = Instant::now();
        let response = next.run(request).await;
        let duration = start.elapsed().as_secs_f64();
        let status_code = response.status().as_u16().to_string();

        metrics
            .request_count
            .with_label_values(&[&method, &endpoint, &status_code])
            .inc();
        metrics
            .request_duration
            .with_label_values(&[&method, &endpoint])
            .observe(duration);

        let model = response.extensions().get::<ModelName>().map(|m| m.0.as_str());
        let session = response
            .extensions()
            .get::<SessionName>()
            .map(|s| s.0.as_str());

        match (model, session) {
            (Some(model), Some(session)) => tracing::info!(
                "{} {} - status={} session={} model={} ttfb={:.3}s",
                method,
                path,
                status_code,
                session,
                model,
                duration
            ),
            _ => tracing::info!(
                "{} {} - status={} duration={:.3}s",
                method,
                path,
                status_code,
                duration
            ),
        }

        metrics
            .active_requests
            .with_label_values(&[&endpoint])
            .dec();

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logging::get_request_id;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use prometheus::{Encoder, TextEncoder};
    use tower::ServiceExt;

    fn app() -> Router {
        crate::core::metrics::init_metrics();
        Router::new()
            .route("/id", get(|| async { get_request_id() }))
            .route("/items/:item", get(|| async { "item" }))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .layer(middleware::from_fn(MetricsMiddleware::track_metrics))
            .layer(middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let request = Request::builder()
            .uri("/id")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "abc-123");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abc-123");
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let request = Request::builder().uri("/id").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();
        let id = response.headers()["x-request-id"].to_str().unwrap().to_string();
        assert_eq!(id.len(), 36);
    }

    #[tokio::test]
    async fn test_request_is_counted() {
        let metrics = crate::core::metrics::init_metrics();
        let before = metrics
            .request_count
            .with_label_values(&["GET", "/id", "200"])
            .get();

        let request = Request::builder().uri("/id").body(Body::empty()).unwrap();
        app().oneshot(request).await.unwrap();

        let after = metrics
            .request_count
            .with_label_values(&["GET", "/id", "200"])
            .get();
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_endpoint_label_is_route_template() {
        let metrics = crate::core::metrics::init_metrics();
        let before = metrics
            .request_count
            .with_label_values(&["GET", "/items/:item", "200"])
            .get();

        let request = Request::builder()
            .uri("/items/42")
            .body(Body::empty())
            .unwrap();
        app().oneshot(request).await.unwrap();

        let after = metrics
            .request_count
            .with_label_values(&["GET", "/items/:item", "200"])
            .get();
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_unmatched_paths_share_one_label() {
        let metrics = crate::core::metrics::init_metrics();
        let before = metrics
            .request_count
            .with_label_values(&["GET", FALLBACK_ENDPOINT, "404"])
            .get();

        for path in ["/wp-login-7f3a.php", "/.env-7f3a"] {
            let request = Request::builder().uri(path).body(Body::empty()).unwrap();
            let response = app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let after = metrics
            .request_count
            .with_label_values(&["GET", FALLBACK_ENDPOINT, "404"])
            .get();
        assert!(after >= before + 2);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .unwrap();
        let exposition = String::from_utf8(buffer).unwrap();
        assert!(!exposition.contains("7f3a"));
    }
}
