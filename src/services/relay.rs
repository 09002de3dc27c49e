//! Chat relay: validates a chat request, resolves its session and opens the
//! provider stream the HTTP layer forwards to the caller.

use crate::api::models::ChatRequest;
use crate::core::error::MESSAGE_REQUIRED;
use crate::core::logging::{get_request_id, get_session_id};
use crate::core::metrics::{get_metrics, init_metrics};
use crate::core::{AppError, ProviderError, Result};
use crate::services::provider::{ChatProvider, ConversationHandle, FragmentStream};
use crate::services::session_registry::SessionRegistry;
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Session used when a request does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Lifecycle of a single relayed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    Received,
    ResolvingSession,
    Streaming,
    Completed,
    Failed,
}

impl RelayPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayPhase::Received => "received",
            RelayPhase::ResolvingSession => "resolving_session",
            RelayPhase::Streaming => "streaming",
            RelayPhase::Completed => "completed",
            RelayPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted chat turn whose reply is ready to be streamed.
pub struct RelayStream {
    pub session_id: String,
    pub model: String,
    /// Reply fragments, first one already pulled from the provider
    pub fragments: FragmentStream,
    /// When the message was handed to the provider
    pub started_at: Instant,
}

impl fmt::Debug for RelayStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayStream")
            .field("session_id", &self.session_id)
            .field("model", &self.model)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

pub struct ChatRelay {
    provider: Arc<dyn ChatProvider>,
    sessions: Arc<SessionRegistry>,
    system_prompt: Arc<str>,
}

impl ChatRelay {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        sessions: Arc<SessionRegistry>,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        init_metrics();
        Self {
            provider,
            sessions,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Extract the message and session id, rejecting requests without a
    /// non-empty message.
    pub fn validate(request: &ChatRequest) -> Result<(&str, &str)> {
        let message = match request.message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ => return Err(AppError::BadRequest(MESSAGE_REQUIRED.to_string())),
        };
        let session_id = request.session_id.as_deref().unwrap_or(DEFAULT_SESSION_ID);
        Ok((message, session_id))
    }

    /// Look up the conversation for `session_id`, starting one if needed.
    pub fn resolve_session(
        &self,
        session_id: &str,
    ) -> std::result::Result<ConversationHandle, ProviderError> {
        let mut created = false;
        let handle = self.sessions.get_or_create(session_id, || {
            created = true;
            self.provider.start_chat(&self.system_prompt)
        });

        match handle {
            Ok(handle) => {
                if created {
                    let metrics = get_metrics();
                    metrics.sessions.inc();
                    tracing::info!(
                        session_id = %session_id,
                        provider = %self.provider.name(),
                        sessions = self.sessions.len(),
                        "Started new conversation"
                    );
                }
                Ok(handle)
            }
            Err(e) => Err(self.record_failure("start_chat", e)),
        }
    }

    /// Run a request up to the point where its reply can be streamed.
    ///
    /// The first non-empty fragment is awaited here so that a provider failure
    /// before any text exists is still reported with an error status.
    pub async fn open(&self, request: ChatRequest) -> Result<RelayStream> {
        let (message, session_id) = match Self::validate(&request) {
            Ok(parts) => parts,
            Err(e) => {
                get_metrics()
                    .relay_outcomes
                    .with_label_values(&["rejected"])
                    .inc();
                return Err(e);
            }
        };
        let message = message.to_string();
        let session_id = session_id.to_string();
        self.log_phase(&session_id, RelayPhase::Received);

        self.log_phase(&session_id, RelayPhase::ResolvingSession);
        let conversation = self.resolve_session(&session_id)?;

        let started_at = Instant::now();
        let mut stream = conversation
            .send_message_stream(message)
            .await
            .map_err(|e| self.record_failure("send", e))?;

        let first = loop {
            match stream.next().await {
                Some(Ok(text)) if text.is_empty() => continue,
                Some(Ok(text)) => break Some(text),
                Some(Err(e)) => return Err(self.record_failure("stream", e).into()),
                None => break None,
            }
        };

        if first.is_some() {
            get_metrics()
                .time_to_first_fragment
                .with_label_values(&[self.model()])
                .observe(started_at.elapsed().as_secs_f64());
        }
        self.log_phase(&session_id, RelayPhase::Streaming);

        let fragments = futures::stream::iter(first.map(Ok)).chain(stream).boxed();

        Ok(RelayStream {
            session_id,
            model: self.model().to_string(),
            fragments,
            started_at,
        })
    }

    fn log_phase(&self, session_id: &str, phase: RelayPhase) {
        tracing::debug!(session_id = %session_id, phase = %phase, "Relay phase");
    }

    /// Count and log a provider failure that happened before the response was
    /// committed. This is the only place such failures are logged; the HTTP
    /// layer just maps them to the generic 500.
    fn record_failure(&self, stage: &str, error: ProviderError) -> ProviderError {
        let metrics = get_metrics();
        metrics.provider_errors.with_label_values(&[stage]).inc();
        metrics.relay_outcomes.with_label_values(&["failed"]).inc();
        tracing::error!(
            request_id = %get_request_id(),
            session_id = %get_session_id(),
            provider = %self.provider.name(),
            stage = %stage,
            phase = %RelayPhase::Failed,
            error = %error,
            "Provider call failed"
        );
        error
    }
}
