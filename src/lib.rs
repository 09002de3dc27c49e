//! Gemini Relay - a minimal streaming chat relay
//!
//! `POST /api/chat` takes a message and an optional session id, forwards the
//! message to Google's Gemini API and streams the reply text back as it is
//! generated. Each session id maps to one in-memory conversation, so follow-up
//! messages carry the earlier turns.
//!
//! # Architecture
//!
//! - [`core`]: configuration, errors, logging context, metrics, middleware
//! - [`api`]: HTTP handlers, request models, body streaming, router
//! - [`services`]: session registry, chat relay, provider trait and Gemini client
//! - [`transformer`]: Gemini wire format and SSE decoding
//!
//! # Configuration
//!
//! Required environment variables:
//! - `GEMINI_API_KEY`: API key for the Generative Language API
//!
//! Optional environment variables:
//! - `HOST`: Server bind address (default: 0.0.0.0)
//! - `PORT`: Server port (default: 3000)
//! - `GEMINI_MODEL`: Model name (default: gemini-1.5-flash)
//! - `GEMINI_API_BASE`: API base URL
//! - `SYSTEM_PROMPT_FILE`: File replacing the built-in system prompt
//! - `STATIC_DIR`: Directory served at `/` (default: public)
//! - `VERIFY_SSL`: Verify SSL certificates for upstream (default: true)
//! - `REQUEST_TIMEOUT_SECS`: Upstream request timeout in seconds (default: 300)

pub mod api;
pub mod core;
pub mod services;
pub mod transformer;

// Re-export commonly used types for convenience
pub use api::{build_router, AppState, ChatRequest};
pub use core::{AppConfig, AppError, ProviderError, Result};
pub use services::{ChatProvider, ChatRelay, Conversation, GeminiProvider, SessionRegistry};
