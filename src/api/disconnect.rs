use crate::core::metrics::init_metrics;
use crate::core::{StreamCancelHandle, StreamOutcome};
use axum::body::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A body stream wrapper that notices the caller going away.
///
/// Hyper drops the response body when the connection closes. If that happens
/// before the relay recorded an outcome, the stream counts as cancelled.
pub struct DisconnectStream<S> {
    pub stream: S,
    pub cancel_handle: StreamCancelHandle,
    pub session_id: String,
}

impl<S, E> Stream for DisconnectStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

impl<S> Drop for DisconnectStream<S> {
    fn drop(&mut self) {
        if self.cancel_handle.cancel() {
            tracing::info!(
                session_id = %self.session_id,
                "Client disconnected - stopped relaying fragments"
            );
            init_metrics()
                .relay_outcomes
                .with_label_values(&[StreamOutcome::Cancelled.as_str()])
                .inc();
        }
    }
}
