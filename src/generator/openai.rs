//! OpenAI-compatible chat completion backend (`/v1/chat/completions`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_API_URL;
use crate::error::GeneratorError;
use crate::generator::Backend;

const PROVIDER: &str = "openai";
const OPENAI_API_URL: &str = "https://api.openai.com";

const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;

pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_token: String,
}

impl OpenAiBackend {
    pub fn new(client: Client, base_url: &str, model: &str, api_token: &str) -> Self {
        // The configured URL defaults to the local Ollama endpoint; when it
        // was never changed, talk to the hosted API instead.
        let base = if base_url == DEFAULT_API_URL {
            OPENAI_API_URL
        } else {
            base_url
        };
        Self {
            client,
            base_url: base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_token: api_token.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|source| GeneratorError::RequestFailed {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::ApiError {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|source| GeneratorError::DecodeFailed {
                    provider: PROVIDER,
                    source,
                })?;

        let message = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if message.is_empty() {
            return Err(GeneratorError::EmptyCompletion { provider: PROVIDER });
        }
        Ok(message)
    }
}
