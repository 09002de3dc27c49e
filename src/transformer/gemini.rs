//! Gemini `generateContent` wire format.
//!
//! Only the subset the relay needs: text parts in, text parts out, plus the
//! fields that signal a blocked prompt or candidate.

use crate::core::ProviderError;
use serde::{Deserialize, Serialize};

/// Finish reasons for which a candidate carries no usable text.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Build the streaming endpoint URL for a model.
pub fn stream_generate_content_url(api_base: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
        api_base.trim_end_matches('/'),
        model
    )
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn with_role(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part::text(text)],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role("user", text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role("model", text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::with_role("system", text)
    }

    /// Concatenated text of all non-thought parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}

/// Body of a `streamGenerateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

/// One streamed response chunk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u64>,
    #[serde(default)]
    pub candidates_token_count: Option<u64>,
    #[serde(default)]
    pub total_token_count: Option<u64>,
}

impl GenerateContentResponse {
    /// Text carried by this chunk.
    ///
    /// Only the first candidate is read. A chunk without candidates yields an
    /// empty string unless the prompt itself was blocked.
    pub fn text(&self) -> Result<String, ProviderError> {
        let Some(candidate) = self.candidates.first() else {
            if let Some(reason) = self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref())
            {
                return Err(ProviderError::Blocked(format!("prompt blocked: {}", reason)));
            }
            return Ok(String::new());
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKING_FINISH_REASONS.contains(&reason) {
                return Err(ProviderError::Blocked(format!(
                    "candidate finished with {}",
                    reason
                )));
            }
        }

        Ok(candidate
            .content
            .as_ref()
            .map(Content::text)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_stream_url() {
        assert_eq!(
            stream_generate_content_url("http://localhost:8080/", "gemini-1.5-flash"),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("hello")],
            system_instruction: Some(Content::system("be brief")),
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "systemInstruction": {"role": "system", "parts": [{"text": "be brief"}]}
            })
        );
    }

    #[test]
    fn test_response_text() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hi"}, {"text": " there"}]},
                "index": 0
            }],
            "usageMetadata": {"promptTokenCount": 3, "totalTokenCount": 5}
        }))
        .unwrap();

        assert_eq!(chunk.text().unwrap(), "Hi there");
        assert_eq!(chunk.usage_metadata.unwrap().prompt_token_count, Some(3));
    }

    #[test]
    fn test_thought_parts_are_skipped() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "pondering", "thought": true},
                    {"text": "answer"}
                ]}
            }]
        }))
        .unwrap();

        assert_eq!(chunk.text().unwrap(), "answer");
    }

    #[test]
    fn test_final_chunk_without_content() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "STOP"}]
        }))
        .unwrap();

        assert_eq!(chunk.text().unwrap(), "");
    }

    #[test]
    fn test_blocked_prompt() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        assert_matches!(chunk.text(), Err(ProviderError::Blocked(reason)) if reason.contains("SAFETY"));
    }

    #[test]
    fn test_blocked_candidate() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "RECITATION"}]
        }))
        .unwrap();

        assert_matches!(chunk.text(), Err(ProviderError::Blocked(_)));
    }
}
