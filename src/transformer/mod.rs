//! Provider wire formats.
//!
//! - [`gemini`]: request/response types of the Gemini `generateContent` API
//! - [`stream`]: server-sent events decoding of streamed responses

pub mod gemini;
pub mod stream;

pub use gemini::{
    stream_generate_content_url, Content, GenerateContentRequest, GenerateContentResponse, Part,
    UsageMetadata,
};
pub use stream::{SseEvent, SseParser};
