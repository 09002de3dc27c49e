//! Provider interface.
//!
//! A [`ChatProvider`] hands out conversation handles; a [`Conversation`]
//! streams the reply to one message at a time while keeping its own
//! multi-turn context.

use crate::core::ProviderError;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Text fragments of one reply, in the order the provider produced them.
pub type FragmentStream = BoxStream<'static, Result<String, ProviderError>>;

/// Opaque, shareable handle on a provider-side conversation.
pub type ConversationHandle = Arc<dyn Conversation>;

pub trait ChatProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Model every conversation of this provider talks to.
    fn model(&self) -> &str;

    /// Start a new conversation primed with `system_instruction`.
    ///
    /// Must not block on I/O: it runs while the session registry holds the
    /// entry for the session being created.
    fn start_chat(&self, system_instruction: &str) -> Result<ConversationHandle, ProviderError>;
}

pub trait Conversation: Send + Sync {
    /// Send `message` and start streaming the reply.
    ///
    /// The future resolves once the provider accepted the request; fragments
    /// then arrive through the returned stream.
    fn send_message_stream(
        &self,
        message: String,
    ) -> BoxFuture<'static, Result<FragmentStream, ProviderError>>;
}
