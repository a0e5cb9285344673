//! OpenAI-compatible chat completion client (spec §6 "LLM client"). No LLM
//! client exists anywhere in the teacher's tree (its analyst pass is pure
//! TA-indicator based); built directly from spec §6 reusing the same
//! `HttpClientFactory` retry/pool pattern as the broker and DEX adapters,
//! with request/response shapes following the OpenAI chat completions API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{ChatMessage, CompletionRequest, CompletionResponse, LlmClient, Usage};
use crate::infrastructure::core::http_client_factory::HttpClientFactory;

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    client: ClientWithMiddleware,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            client: HttpClientFactory::create_client(),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: HttpClientFactory::create_client(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: WireUsage,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let wire = WireRequest {
            model: request.model,
            messages: request
                .messages
                .into_iter()
                .map(|m: ChatMessage| WireMessage {
                    role: m.role.to_string(),
                    content: m.content,
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&wire)
            .send()
            .await
            .context("llm completion request failed")?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("llm completion rejected: {text}");
        }

        let parsed: WireResponse = resp.json().await.context("failed to parse llm completion response")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("llm completion returned no choices")?;

        Ok(CompletionResponse {
            content,
            usage: Usage {
                prompt_tokens: parsed.usage.prompt_tokens,
                completion_tokens: parsed.usage.completion_tokens,
            },
        })
    }
}
