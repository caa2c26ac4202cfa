//! Configuration types for the Unreal Speech API.

use serde::{Deserialize, Serialize};

use crate::core::tts::base::{SynthesisError, SynthesisResult};

/// Unreal Speech synthesis endpoint (v8).
pub const UNREAL_SPEECH_TTS_URL: &str = "https://api.v8.unrealspeech.com/speech";

/// Default narrator voice.
pub const DEFAULT_VOICE_ID: &str = "am_michael";

/// Default encoder bitrate requested from the provider.
pub const DEFAULT_BITRATE: &str = "320k";

/// How the provider should return the rendered audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// A fetchable locator pointing at the rendered file
    #[default]
    Uri,
}

impl OutputMode {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uri => "uri",
        }
    }
}

/// Settings for [`super::UnrealSpeechTTS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrealSpeechConfig {
    pub api_key: String,
    /// Submission endpoint; overridable for self-hosted proxies and tests
    pub endpoint: String,
    pub voice_id: String,
    /// Provider bitrate string such as `320k`
    pub bitrate: String,
    pub output_mode: OutputMode,
}

impl Default for UnrealSpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: UNREAL_SPEECH_TTS_URL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            bitrate: DEFAULT_BITRATE.to_string(),
            output_mode: OutputMode::Uri,
        }
    }
}

impl UnrealSpeechConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Check the settings before any request is sent.
    pub fn validate(&self) -> SynthesisResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(SynthesisError::InvalidConfiguration(
                "Unreal Speech API key is required".to_string(),
            ));
        }
        if self.voice_id.trim().is_empty() {
            return Err(SynthesisError::InvalidConfiguration(
                "voice_id must not be empty".to_string(),
            ));
        }
        if !is_valid_bitrate(&self.bitrate) {
            return Err(SynthesisError::InvalidConfiguration(format!(
                "bitrate must look like '320k', got '{}'",
                self.bitrate
            )));
        }
        url::Url::parse(&self.endpoint).map_err(|e| {
            SynthesisError::InvalidConfiguration(format!(
                "invalid endpoint '{}': {e}",
                self.endpoint
            ))
        })?;
        Ok(())
    }
}

/// Bitrates are a whole number of kilobits followed by `k`, e.g. `320k`.
pub fn is_valid_bitrate(bitrate: &str) -> bool {
    bitrate
        .strip_suffix('k')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
