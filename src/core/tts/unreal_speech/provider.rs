//! Unreal Speech provider implementation.
//!
//! # API Reference
//!
//! - Submit: `POST https://api.v8.unrealspeech.com/speech` with a JSON body,
//!   answered with `{ "OutputUri": "..." }` when `OutputFormat` is `uri`
//! - Download: plain `GET` against the returned locator
//! - Input limit: 3000 characters per request

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::config::UnrealSpeechConfig;
use crate::core::retry::RateLimitPolicy;
use crate::core::tts::base::{SpeechSynthesizer, SynthesisError, SynthesisResult};

/// Timeout for the submission request.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for downloading a rendered file, which can be large.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// The only container this pipeline produces.
const AUDIO_FORMAT: &str = "mp3";

const TIMESTAMP_TYPE: &str = "sentence";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SpeechRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    bitrate: &'a str,
    audio_format: &'a str,
    output_format: &'a str,
    timestamp_type: &'a str,
    #[serde(rename = "sync")]
    sync: bool,
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    #[serde(rename = "OutputUri")]
    output_uri: Option<String>,
}

/// Whether an error body reads like throttling even without a 429 status.
pub(crate) fn is_throttle_message(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("rate limit")
        || lower.contains("too many requests")
        || lower.contains("throttl")
}

/// Map a failed submission response to an error.
pub(crate) fn classify_status(status: StatusCode, body: String) -> SynthesisError {
    if status == StatusCode::TOO_MANY_REQUESTS || is_throttle_message(&body) {
        return SynthesisError::RateLimited(body);
    }
    match status.as_u16() {
        401 | 403 => SynthesisError::InvalidConfiguration(format!(
            "Authentication rejected ({status}): {body}"
        )),
        _ => SynthesisError::ProviderError(format!("HTTP {status}: {body}")),
    }
}

fn classify_transport(stage: &str, e: reqwest::Error) -> SynthesisError {
    if e.is_timeout() {
        SynthesisError::Timeout(format!("{stage}: {e}"))
    } else {
        SynthesisError::NetworkError(format!("{stage}: {e}"))
    }
}

/// Unreal Speech client: submit text, then fetch the rendered file.
#[derive(Clone)]
pub struct UnrealSpeechTTS {
    client: reqwest::Client,
    config: UnrealSpeechConfig,
    rate_limit: RateLimitPolicy,
}

impl UnrealSpeechTTS {
    pub fn new(config: UnrealSpeechConfig) -> SynthesisResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("podcast-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                SynthesisError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            config,
            rate_limit: RateLimitPolicy::default(),
        })
    }

    /// Override the rate-limit policy (tests use short waits).
    pub fn with_rate_limit_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = policy;
        self
    }

    pub fn config(&self) -> &UnrealSpeechConfig {
        &self.config
    }

    fn request_body<'a>(&'a self, text: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            text,
            voice_id: &self.config.voice_id,
            bitrate: &self.config.bitrate,
            audio_format: AUDIO_FORMAT,
            output_format: self.config.output_mode.as_str(),
            timestamp_type: TIMESTAMP_TYPE,
            sync: false,
        }
    }

    /// Submit text and return the locator of the rendered audio.
    async fn submit(&self, text: &str, attempt: u32) -> SynthesisResult<String> {
        debug!(chars = text.chars().count(), attempt, "Submitting text to Unreal Speech");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(text))
            .timeout(SUBMIT_TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_transport("submit", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Unreal Speech API returned error");
            return Err(classify_status(status, body));
        }

        let parsed: SpeechResponse = response.json().await.map_err(|e| {
            SynthesisError::InvalidResponse(format!("Failed to parse response: {e}"))
        })?;

        match parsed.output_uri {
            Some(uri) if !uri.trim().is_empty() => {
                info!(uri = %uri, "Audio locator generated");
                Ok(uri)
            }
            _ => Err(SynthesisError::InvalidResponse(
                "response did not contain OutputUri".to_string(),
            )),
        }
    }

    /// Fetch the rendered audio from its locator.
    async fn download(&self, uri: &str) -> SynthesisResult<Bytes> {
        let response = self
            .client
            .get(uri)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_transport("download", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::DownloadFailed(format!(
                "HTTP {status} fetching rendered audio"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport("download", e))?;

        if bytes.is_empty() {
            return Err(SynthesisError::DownloadFailed(
                "rendered audio is empty".to_string(),
            ));
        }

        info!(bytes = bytes.len(), "Downloaded rendered audio");
        Ok(bytes)
    }
}

#[async_trait]
impl SpeechSynthesizer for UnrealSpeechTTS {
    async fn synthesize(&self, text: &str) -> SynthesisResult<Bytes> {
        let uri = self
            .rate_limit
            .run("unreal_speech.submit", |attempt| self.submit(text, attempt))
            .await?;
        self.download(&uri).await
    }

    fn provider_name(&self) -> &'static str {
        "unreal_speech"
    }
}
