use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::core::retry::RateLimitSignal;

/// Errors raised while synthesizing one chunk of text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Throttling signal from the provider; retried locally
    #[error("Provider rate limited: {0}")]
    RateLimited(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Audio download failed: {0}")]
    DownloadFailed(String),
}

impl RateLimitSignal for SynthesisError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, SynthesisError::RateLimited(_))
    }

    fn into_exhausted(self, attempts: u32) -> Self {
        SynthesisError::ProviderError(format!(
            "still rate limited after {attempts} attempts: {self}"
        ))
    }
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Encoded audio for one chunk, tagged with the chunk's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    pub sequence_index: usize,
    pub data: Bytes,
}

impl AudioSegment {
    pub fn new(sequence_index: usize, data: Bytes) -> Self {
        Self {
            sequence_index,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A remote text-to-speech provider.
///
/// One call turns one chunk of text into encoded audio bytes. Implementations
/// absorb provider throttling internally and only return
/// [`SynthesisError::RateLimited`] if they choose not to retry.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> SynthesisResult<Bytes>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        assert!(SynthesisError::RateLimited("429".into()).is_rate_limited());
        assert!(!SynthesisError::NetworkError("reset".into()).is_rate_limited());
        assert!(!SynthesisError::Timeout("30s".into()).is_rate_limited());
    }

    #[test]
    fn test_exhausted_rate_limit_becomes_provider_error() {
        let err = SynthesisError::RateLimited("slow down".into()).into_exhausted(4);
        match err {
            SynthesisError::ProviderError(msg) => {
                assert!(msg.contains("4 attempts"));
                assert!(msg.contains("slow down"));
            }
            other => panic!("expected ProviderError, got {other:?}"),
        }
    }
}
