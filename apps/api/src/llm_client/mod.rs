//! LLM Client: the single point of entry for all outbound model calls in folio.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! Chat fan-out goes through `ChatBackend`, which this client implements.
//!
//! Claude goes to the Anthropic Messages API; ChatGPT and Llama go to OpenAI-compatible
//! chat-completion endpoints (OpenAI and Together respectively).
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::chat::ChatBackend;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const TOGETHER_API_URL: &str = "https://api.together.xyz/v1/chat/completions";
const TEMPERATURE: f32 = 0.7;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("{provider} API key is not configured")]
    NotConfigured { provider: &'static str },
}

// ────────────────────────────────────────────────────────────────────────────
// Models and providers
// ────────────────────────────────────────────────────────────────────────────

/// The models a user can select in the chat panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatModel {
    Claude,
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Llama,
}

impl FromStr for ChatModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(ChatModel::Claude),
            "chatgpt" => Ok(ChatModel::ChatGpt),
            "llama" => Ok(ChatModel::Llama),
            other => Err(format!("unknown chat model '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
    Together,
}

impl Provider {
    fn name(self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic",
            Provider::OpenAi => "OpenAI",
            Provider::Together => "Together",
        }
    }
}

/// Request parameters for one chat model. Hardcoded per model to prevent drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelProfile {
    pub provider: Provider,
    pub model: &'static str,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
}

pub fn profile(model: ChatModel) -> ModelProfile {
    match model {
        ChatModel::Claude => ModelProfile {
            provider: Provider::Anthropic,
            model: "claude-3-opus-20240229",
            max_tokens: 1024,
            top_p: None,
        },
        ChatModel::ChatGpt => ModelProfile {
            provider: Provider::OpenAi,
            model: "gpt-4o-mini",
            max_tokens: 150,
            top_p: None,
        },
        ChatModel::Llama => ModelProfile {
            provider: Provider::Together,
            model: "meta-llama/Llama-3-70b-chat-hf",
            max_tokens: 1024,
            top_p: Some(0.7),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    pub content: Vec<ContentBlock>,
    pub usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl AnthropicResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

/// Error envelope shared by Anthropic and OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Per-provider API keys. A missing key disables that provider only.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub anthropic: Option<String>,
    pub openai: Option<String>,
    pub together: Option<String>,
}

impl ProviderKeys {
    fn key_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Anthropic => self.anthropic.as_deref(),
            Provider::OpenAi => self.openai.as_deref(),
            Provider::Together => self.together.as_deref(),
        }
    }
}

/// The single LLM client used by all services in folio.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    keys: ProviderKeys,
}

impl LlmClient {
    pub fn new(keys: ProviderKeys) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            keys,
        }
    }

    /// Sends one prompt to `model` and returns the reply text.
    pub async fn call(
        &self,
        model: ChatModel,
        prompt: &str,
        system: &str,
    ) -> Result<String, LlmError> {
        let profile = profile(model);
        let key = self
            .keys
            .key_for(profile.provider)
            .ok_or(LlmError::NotConfigured {
                provider: profile.provider.name(),
            })?;

        let text = match profile.provider {
            Provider::Anthropic => {
                let body = AnthropicRequest {
                    model: profile.model,
                    max_tokens: profile.max_tokens,
                    temperature: TEMPERATURE,
                    system,
                    messages: vec![WireMessage {
                        role: "user",
                        content: prompt,
                    }],
                };
                let raw = self
                    .post_with_retry(profile.provider, key, &body)
                    .await?
                    .text()
                    .await?;
                let response: AnthropicResponse = serde_json::from_str(&raw)?;
                debug!(
                    model = profile.model,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM call succeeded"
                );
                response.text().map(str::to_owned)
            }
            Provider::OpenAi | Provider::Together => {
                let body = ChatCompletionRequest {
                    model: profile.model,
                    max_tokens: profile.max_tokens,
                    temperature: TEMPERATURE,
                    top_p: profile.top_p,
                    messages: vec![
                        WireMessage {
                            role: "system",
                            content: system,
                        },
                        WireMessage {
                            role: "user",
                            content: prompt,
                        },
                    ],
                };
                let raw = self
                    .post_with_retry(profile.provider, key, &body)
                    .await?
                    .text()
                    .await?;
                let response: ChatCompletionResponse = serde_json::from_str(&raw)?;
                debug!(model = profile.model, "LLM call succeeded");
                response.text().map(str::to_owned)
            }
        };

        text.filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    fn authorized(&self, provider: Provider, key: &str) -> RequestBuilder {
        match provider {
            Provider::Anthropic => self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            Provider::OpenAi => self.client.post(OPENAI_API_URL).bearer_auth(key),
            Provider::Together => self.client.post(TOGETHER_API_URL).bearer_auth(key),
        }
    }

    /// POSTs `body`, retrying on 429 and 5xx with exponential backoff (1s, 2s).
    async fn post_with_retry<B: Serialize + Sync>(
        &self,
        provider: Provider,
        key: &str,
        body: &B,
    ) -> Result<reqwest::Response, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "{} call attempt {} failed, retrying after {}ms...",
                    provider.name(),
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.authorized(provider, key).json(body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("{} API returned {}: {}", provider.name(), status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(
        &self,
        model: ChatModel,
        prompt: &str,
        system: &str,
    ) -> Result<String, LlmError> {
        self.call(model, prompt, system).await
    }
}

/// Pulls the human-readable message out of a provider error body, falling back to the raw body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
