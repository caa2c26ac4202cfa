use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::mood::MoodLabel;
use crate::core::retry::RateLimitSignal;

/// Errors from the external text generator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TextGenerationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Generator rate limited: {0}")]
    RateLimited(String),

    #[error("Generator error: {0}")]
    ProviderError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    /// The generator answered but the message had no usable text
    #[error("Generator returned no content for {0}")]
    EmptyContent(String),

    #[error("Invalid generator response: {0}")]
    InvalidResponse(String),
}

impl RateLimitSignal for TextGenerationError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, TextGenerationError::RateLimited(_))
    }

    fn into_exhausted(self, attempts: u32) -> Self {
        TextGenerationError::ProviderError(format!(
            "still rate limited after {attempts} attempts: {self}"
        ))
    }
}

pub type TextGenerationResult<T> = Result<T, TextGenerationError>;

/// A generated script and its mood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeContent {
    pub script_text: String,
    pub mood_label: MoodLabel,
}

impl NarrativeContent {
    pub fn new(script_text: impl Into<String>, mood_label: MoodLabel) -> Self {
        Self {
            script_text: script_text.into(),
            mood_label,
        }
    }
}

/// External language-model collaborator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a script sized for `minutes` of speech plus its mood.
    async fn generate_narrative(
        &self,
        topic: &str,
        minutes: u32,
    ) -> TextGenerationResult<NarrativeContent>;

    /// Classify a topic into a mood label alone.
    async fn classify_mood(&self, topic: &str) -> TextGenerationResult<MoodLabel>;
}
