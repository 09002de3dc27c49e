//! Gemini implementation of the provider interface.
//!
//! Conversations keep their history locally and resend it with every message,
//! the way the Generative Language API expects multi-turn chats to be driven.

use crate::core::{GeminiConfig, ProviderError};
use crate::services::provider::{ChatProvider, Conversation, ConversationHandle, FragmentStream};
use crate::transformer::{
    stream_generate_content_url, Content, GenerateContentRequest, GenerateContentResponse,
    SseParser, UsageMetadata,
};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Upstream error bodies are logged, so keep them short.
const MAX_ERROR_BODY_CHARS: usize = 500;

pub struct GeminiProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: Arc<str>,
    model: String,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, config: &GeminiConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            api_key: Arc::from(config.api_key.as_str()),
            model: config.model.clone(),
        }
    }
}

impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn start_chat(&self, system_instruction: &str) -> Result<ConversationHandle, ProviderError> {
        let system_instruction = if system_instruction.trim().is_empty() {
            None
        } else {
            Some(Content::system(system_instruction))
        };

        Ok(Arc::new(GeminiChat {
            client: self.client.clone(),
            url: stream_generate_content_url(&self.api_base, &self.model),
            api_key: self.api_key.clone(),
            system_instruction,
            history: Arc::new(Mutex::new(Vec::new())),
        }))
    }
}

/// A multi-turn Gemini chat.
///
/// The history lock is held from the moment a message is sent until its reply
/// stream ends or is dropped, so turns on one chat never interleave.
struct GeminiChat {
    client: reqwest::Client,
    url: String,
    api_key: Arc<str>,
    system_instruction: Option<Content>,
    history: Arc<Mutex<Vec<Content>>>,
}

impl Conversation for GeminiChat {
    fn send_message_stream(
        &self,
        message: String,
    ) -> BoxFuture<'static, Result<FragmentStream, ProviderError>> {
        let client = self.client.clone();
        let url = self.url.clone();
        let api_key = self.api_key.clone();
        let system_instruction = self.system_instruction.clone();
        let history = self.history.clone();

        async move {
            let history = history.lock_owned().await;
            let user_turn = Content::user(message);

            let mut contents = history.clone();
            contents.push(user_turn.clone());
            let body = GenerateContentRequest {
                contents,
                system_instruction,
            };

            tracing::debug!(
                url = %url,
                turns = body.contents.len(),
                "Sending streamGenerateContent request"
            );

            let response = client
                .post(&url)
                .header(API_KEY_HEADER, api_key.as_ref())
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                });
            }

            Ok(reply_stream(response, history, user_turn))
        }
        .boxed()
    }
}

/// Decode the SSE reply into text fragments.
///
/// The user turn and the aggregated reply are appended to the history only
/// after the provider finished without error and produced some text. Gemini
/// rejects turns with empty parts, so recording an empty reply would break
/// every later message of the session.
fn reply_stream(
    response: reqwest::Response,
    mut history: OwnedMutexGuard<Vec<Content>>,
    user_turn: Content,
) -> FragmentStream {
    let stream = async_stream::stream! {
        let mut body = response.bytes_stream();
        let mut parser = SseParser::new();
        let mut reply = String::new();
        let mut usage: Option<UsageMetadata> = None;
        let mut ended = false;

        while !ended {
            let events = match body.next().await {
                Some(Ok(bytes)) => parser.push(&bytes),
                Some(Err(e)) => {
                    yield Err(ProviderError::from(e));
                    return;
                }
                None => {
                    ended = true;
                    parser.finish().into_iter().collect()
                }
            };

            for event in events {
                let chunk = match serde_json::from_str::<GenerateContentResponse>(&event.data) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ProviderError::from(e));
                        return;
                    }
                };
                if chunk.usage_metadata.is_some() {
                    usage = chunk.usage_metadata.clone();
                }
                match chunk.text() {
                    Ok(text) if text.is_empty() => {}
                    Ok(text) => {
                        reply.push_str(&text);
                        yield Ok(text);
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        if let Some(usage) = usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_token_count.unwrap_or(0),
                reply_tokens = usage.candidates_token_count.unwrap_or(0),
                total_tokens = usage.total_token_count.unwrap_or(0),
                "Gemini reply finished"
            );
        }

        if reply.is_empty() {
            tracing::warn!(turns = history.len(), "Gemini reply had no text; turn not recorded");
        } else {
            history.push(user_turn);
            history.push(Content::model(reply));
        }
    };

    Box::pin(stream)
}
