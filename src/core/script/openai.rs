//! OpenAI-compatible chat-completions text generator.
//!
//! Works against any endpoint that speaks the `/chat/completions` protocol
//! (OpenAI, Groq, local gateways). The script and the mood are requested
//! sequentially, script first, to keep token-per-minute spikes down.
//!
//! # Rate Limits
//!
//! - HTTP 429, or an error message containing "Rate limit", is retried
//! - The error message usually carries `Please try again in 7.5s`

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::generator::{
    NarrativeContent, TextGenerationError, TextGenerationResult, TextGenerator,
};
use super::mood::MoodLabel;
use super::prompts::{mood_prompt, script_prompt};
use crate::core::retry::RateLimitPolicy;

// =============================================================================
// Constants
// =============================================================================

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";

/// Timeout for one chat-completions request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Token budget bounds for script requests.
const MIN_SCRIPT_TOKENS: u32 = 800;
const MAX_SCRIPT_TOKENS: u32 = 3000;

/// A one-word answer needs almost nothing.
const MOOD_MAX_TOKENS: u32 = 5;

const SCRIPT_TEMPERATURE: f32 = 0.7;
const MOOD_TEMPERATURE: f32 = 0.0;

/// Token budget for a script of `minutes`: ~160 wpm, ~1.2 tokens per word,
/// 1.2x headroom.
pub fn script_max_tokens(minutes: u32) -> u32 {
    let estimate = (f64::from(minutes) * 160.0 * 1.2 * 1.2).floor() as u32;
    estimate.clamp(MIN_SCRIPT_TOKENS, MAX_SCRIPT_TOKENS)
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Pull the human-readable message out of an error body, falling back to the
/// raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// =============================================================================
// Client
// =============================================================================

/// Settings for [`OpenAIGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAIGeneratorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl Default for OpenAIGeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
        }
    }
}

impl OpenAIGeneratorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Text generator backed by an OpenAI-compatible chat endpoint.
#[derive(Clone)]
pub struct OpenAIGenerator {
    client: reqwest::Client,
    config: OpenAIGeneratorConfig,
    rate_limit: RateLimitPolicy,
}

impl OpenAIGenerator {
    pub fn new(config: OpenAIGeneratorConfig) -> TextGenerationResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(TextGenerationError::InvalidConfiguration(
                "OPENAI_API_KEY is required".to_string(),
            ));
        }
        url::Url::parse(&config.base_url).map_err(|e| {
            TextGenerationError::InvalidConfiguration(format!(
                "invalid base URL '{}': {e}",
                config.base_url
            ))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("podcast-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                TextGenerationError::InvalidConfiguration(format!(
                    "Failed to build HTTP client: {e}"
                ))
            })?;

        info!(model = %config.model, "Text generator initialized");

        Ok(Self {
            client,
            config,
            rate_limit: RateLimitPolicy::default(),
        })
    }

    pub fn with_rate_limit_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = policy;
        self
    }

    /// One chat completion, retried on throttling.
    async fn complete(
        &self,
        kind: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> TextGenerationResult<String> {
        debug!(kind, max_tokens, "Requesting chat completion");
        let operation = format!("chat.{kind}");
        self.rate_limit
            .run(&operation, |attempt| {
                self.send_once(kind, prompt, max_tokens, temperature, attempt)
            })
            .await
    }

    async fn send_once(
        &self,
        kind: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        attempt: u32,
    ) -> TextGenerationResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TextGenerationError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            error!(kind, attempt, status = %status, message = %message, "Chat completion failed");

            if status.as_u16() == 429 || message.contains("Rate limit") {
                return Err(TextGenerationError::RateLimited(message));
            }
            if matches!(status.as_u16(), 401 | 403) {
                return Err(TextGenerationError::InvalidConfiguration(format!(
                    "Authentication rejected ({status})"
                )));
            }
            return Err(TextGenerationError::ProviderError(format!(
                "HTTP {status}: {message}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TextGenerationError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| TextGenerationError::EmptyContent(kind.to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAIGenerator {
    async fn generate_narrative(
        &self,
        topic: &str,
        minutes: u32,
    ) -> TextGenerationResult<NarrativeContent> {
        info!(topic, minutes, "Generating script and mood");

        let script = self
            .complete(
                "script",
                &script_prompt(topic, minutes),
                script_max_tokens(minutes),
                SCRIPT_TEMPERATURE,
            )
            .await?;
        let mood = self.classify_mood(topic).await?;

        Ok(NarrativeContent::new(script, mood))
    }

    async fn classify_mood(&self, topic: &str) -> TextGenerationResult<MoodLabel> {
        let raw = self
            .complete("mood", &mood_prompt(topic), MOOD_MAX_TOKENS, MOOD_TEMPERATURE)
            .await?;
        let mood = MoodLabel::from_response(&raw);
        debug!(raw = %raw, mood = %mood, "Mood classified");
        Ok(mood)
    }
}
