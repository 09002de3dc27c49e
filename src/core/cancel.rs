use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// How a relayed stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Still streaming
    Pending,
    /// Provider signalled completion and every fragment was handed to the body
    Completed,
    /// Provider failed after the response was committed
    Failed,
    /// Caller went away before the stream finished
    Cancelled,
}

impl StreamOutcome {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => StreamOutcome::Completed,
            2 => StreamOutcome::Failed,
            3 => StreamOutcome::Cancelled,
            _ => StreamOutcome::Pending,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            StreamOutcome::Pending => 0,
            StreamOutcome::Completed => 1,
            StreamOutcome::Failed => 2,
            StreamOutcome::Cancelled => 3,
        }
    }

    /// Label used for the relay outcome metric.
    pub fn as_str(self) -> &'static str {
        match self {
            StreamOutcome::Pending => "pending",
            StreamOutcome::Completed => "completed",
            StreamOutcome::Failed => "failed",
            StreamOutcome::Cancelled => "cancelled",
        }
    }
}

/// Shared between the body stream and whatever observes the caller going
/// away. The first terminal outcome recorded wins; later ones are ignored.
#[derive(Clone)]
pub struct StreamCancelHandle {
    outcome: Arc<AtomicU8>,
}

impl StreamCancelHandle {
    pub fn new() -> Self {
        Self {
            outcome: Arc::new(AtomicU8::new(StreamOutcome::Pending.as_u8())),
        }
    }

    fn settle(&self, outcome: StreamOutcome) -> bool {
        self.outcome
            .compare_exchange(
                StreamOutcome::Pending.as_u8(),
                outcome.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Record a clean end of stream.
    pub fn mark_completed(&self) -> bool {
        self.settle(StreamOutcome::Completed)
    }

    /// Record a provider failure after the response was committed.
    pub fn mark_failed(&self) -> bool {
        self.settle(StreamOutcome::Failed)
    }

    /// Signal cancellation. Returns `true` only when this call moved the
    /// stream from pending to cancelled.
    pub fn cancel(&self) -> bool {
        self.settle(StreamOutcome::Cancelled)
    }

    pub fn outcome(&self) -> StreamOutcome {
        StreamOutcome::from_u8(self.outcome.load(Ordering::SeqCst))
    }
}

impl Default for StreamCancelHandle {
    fn default() -> Self {
        Self::new()
    }
}
