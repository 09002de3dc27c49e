//! Plain-text streaming of relayed replies.
//!
//! Each provider fragment becomes one body chunk, written as soon as it
//! arrives. Once the response is committed its status can no longer change,
//! so a provider failure past that point is reported in-band: the generic
//! failure text is appended and the body ends.

use crate::api::disconnect::DisconnectStream;
use crate::core::error::UPSTREAM_FAILURE_MESSAGE;
use crate::core::metrics::init_metrics;
use crate::core::{StreamCancelHandle, StreamOutcome};
use crate::services::relay::{RelayPhase, RelayStream};
use axum::body::{Body, Bytes};
use futures::StreamExt;

/// Trailer appended to the body when the provider fails mid-stream.
pub fn mid_stream_failure_trailer() -> String {
    format!("\n{}", UPSTREAM_FAILURE_MESSAGE)
}

/// Turn an opened relay into a response body.
pub fn relay_body(relay: RelayStream, cancel_handle: StreamCancelHandle) -> Body {
    let RelayStream {
        session_id,
        model,
        mut fragments,
        started_at,
    } = relay;

    let handle = cancel_handle.clone();
    let stream_session = session_id.clone();

    let bytes = async_stream::stream! {
        let metrics = init_metrics();
        let mut sent = 0usize;

        while let Some(item) = fragments.next().await {
            match item {
                Ok(text) if text.is_empty() => {}
                Ok(text) => {
                    sent += 1;
                    metrics.fragments.with_label_values(&[&model]).inc();
                    yield Ok::<Bytes, std::io::Error>(Bytes::from(text));
                }
                Err(e) => {
                    if handle.mark_failed() {
                        metrics.provider_errors.with_label_values(&["stream"]).inc();
                        let outcome = StreamOutcome::Failed.as_str();
                        metrics.relay_outcomes.with_label_values(&[outcome]).inc();
                        metrics
                            .stream_duration
                            .with_label_values(&[&model, outcome])
                            .observe(started_at.elapsed().as_secs_f64());
                        tracing::error!(
                            session_id = %stream_session,
                            phase = %RelayPhase::Failed,
                            fragments = sent,
                            error = %e,
                            "Provider stream failed after response was committed"
                        );
                    }
                    yield Ok(Bytes::from(mid_stream_failure_trailer()));
                    return;
                }
            }
        }

        if handle.mark_completed() {
            let outcome = StreamOutcome::Completed.as_str();
            metrics.relay_outcomes.with_label_values(&[outcome]).inc();
            metrics
                .stream_duration
                .with_label_values(&[&model, outcome])
                .observe(started_at.elapsed().as_secs_f64());
            tracing::debug!(
                session_id = %stream_session,
                phase = %RelayPhase::Completed,
                fragments = sent,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "Relay phase"
            );
        }
    };

    Body::from_stream(DisconnectStream {
        stream: Box::pin(bytes),
        cancel_handle,
        session_id,
    })
}
