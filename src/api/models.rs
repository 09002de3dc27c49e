//! Request and response models for the relay API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`.
///
/// Both fields are optional at the JSON level so that a missing message is
/// reported by the relay as a bad request rather than as a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    pub model: String,
}
