//! Unreal Speech TTS provider module.
//!
//! Synthesis is a two-step exchange: the text is submitted with
//! `OutputFormat = "uri"` and the provider answers with a locator for the
//! rendered MP3, which is then fetched with a plain GET.
//!
//! Only the submission step is retried on throttling (HTTP 429 or a
//! "rate limit" style message), honouring a `try again in Xs` hint.
//!
//! # Example
//!
//! ```rust,ignore
//! use podcast_gateway::core::tts::{SpeechSynthesizer, UnrealSpeechConfig, UnrealSpeechTTS};
//!
//! let tts = UnrealSpeechTTS::new(UnrealSpeechConfig::new("your-api-key"))?;
//! let mp3 = tts.synthesize("Hello, world!").await?;
//! ```

mod config;
mod provider;

pub use config::{
    DEFAULT_BITRATE, DEFAULT_VOICE_ID, OutputMode, UNREAL_SPEECH_TTS_URL, UnrealSpeechConfig,
    is_valid_bitrate,
};
pub use provider::UnrealSpeechTTS;
