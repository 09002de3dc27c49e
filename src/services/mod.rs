//! Business logic: sessions, the chat relay, and the model provider.

pub mod gemini_client;
pub mod provider;
pub mod relay;
pub mod session_registry;

pub use gemini_client::GeminiProvider;
pub use provider::{ChatProvider, Conversation, ConversationHandle, FragmentStream};
pub use relay::{ChatRelay, RelayPhase, RelayStream, DEFAULT_SESSION_ID};
pub use session_registry::SessionRegistry;
