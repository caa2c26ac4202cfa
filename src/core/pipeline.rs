//! End-to-end "topic to audio" pipeline.
//!
//! Validate, converge on a script, clean it, chunk it, synthesize and
//! assemble the voice track, then optionally lay a music bed under it.
//! Every failure before mixing is a [`PipelineError`]; mixing failures
//! degrade to voice-only output.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::audio::{
    AssemblyError, AudioAssembler, AudioError, BackgroundMixer, FfmpegTranscoder, FinalAudio,
    MixOptions, MoodMusicTable, MusicFetcher, OUTPUT_BITRATE, Transcoder,
};
use crate::core::script::{
    DurationConvergenceController, OpenAIGenerator, OpenAIGeneratorConfig, TextGenerationError,
    TextGenerator,
};
use crate::core::text::{TextChunk, chunk_ceiling, clean_for_speech, split_into_chunks};
use crate::core::tts::{SpeechSynthesizer, SynthesisError, UnrealSpeechConfig, UnrealSpeechTTS};

pub const MIN_TOPIC_CHARS: usize = 3;
pub const MAX_TOPIC_CHARS: usize = 500;
pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 20;
pub const DEFAULT_MINUTES: u32 = 2;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rejected before any external call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pipeline misconfigured: {0}")]
    Configuration(String),

    #[error("Text generation failed: {0}")]
    Generation(TextGenerationError),

    #[error("Provider rate limited: {0}")]
    ProviderRateLimited(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Synthesis incomplete: chunk {chunk_index} failed after {attempts} attempts: {reason}")]
    IncompleteSynthesis {
        chunk_index: usize,
        attempts: u32,
        reason: String,
    },

    #[error("Audio processing failed: {0}")]
    Audio(#[from] AudioError),
}

impl PipelineError {
    /// Whether the caller, not the system, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::InvalidInput(_))
    }
}

impl From<TextGenerationError> for PipelineError {
    fn from(e: TextGenerationError) -> Self {
        match e {
            TextGenerationError::RateLimited(msg) => PipelineError::ProviderRateLimited(msg),
            TextGenerationError::ProviderError(msg) => PipelineError::ProviderError(msg),
            TextGenerationError::InvalidConfiguration(msg) => PipelineError::Configuration(msg),
            other => PipelineError::Generation(other),
        }
    }
}

impl From<AssemblyError> for PipelineError {
    fn from(e: AssemblyError) -> Self {
        match e {
            AssemblyError::NoChunks => {
                PipelineError::Generation(TextGenerationError::EmptyContent("script".to_string()))
            }
            AssemblyError::IncompleteSynthesis {
                chunk_index,
                attempts,
                source,
            } => PipelineError::IncompleteSynthesis {
                chunk_index,
                attempts,
                reason: source.to_string(),
            },
            AssemblyError::Audio(e) => PipelineError::Audio(e),
        }
    }
}

impl From<SynthesisError> for PipelineError {
    fn from(e: SynthesisError) -> Self {
        match e {
            SynthesisError::InvalidConfiguration(msg) => PipelineError::Configuration(msg),
            SynthesisError::RateLimited(msg) => PipelineError::ProviderRateLimited(msg),
            other => PipelineError::ProviderError(other.to_string()),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

fn default_minutes() -> u32 {
    DEFAULT_MINUTES
}

/// Input of one pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    #[serde(default = "default_minutes")]
    pub minutes: u32,
    #[serde(flatten)]
    pub mix: MixOptions,
}

impl GenerateRequest {
    pub fn new(topic: impl Into<String>, minutes: u32) -> Self {
        Self {
            topic: topic.into(),
            minutes,
            mix: MixOptions::default(),
        }
    }

    pub fn with_mix(mut self, mix: MixOptions) -> Self {
        self.mix = mix;
        self
    }
}

/// Trim, bound-check and strip markup-prone characters from a topic.
pub fn sanitize_topic(raw: &str) -> PipelineResult<String> {
    let trimmed = raw.trim();
    let length = trimmed.chars().count();

    if length == 0 {
        return Err(PipelineError::InvalidInput("Topic cannot be empty".to_string()));
    }
    if length < MIN_TOPIC_CHARS {
        return Err(PipelineError::InvalidInput(format!(
            "Topic must be at least {MIN_TOPIC_CHARS} characters long"
        )));
    }
    if length > MAX_TOPIC_CHARS {
        return Err(PipelineError::InvalidInput(format!(
            "Topic must be at most {MAX_TOPIC_CHARS} characters long"
        )));
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\''))
        .collect();
    if cleaned.trim().is_empty() {
        return Err(PipelineError::InvalidInput(
            "Topic has no usable characters".to_string(),
        ));
    }
    Ok(cleaned)
}

pub fn validate_minutes(minutes: u32) -> PipelineResult<u32> {
    if (MIN_MINUTES..=MAX_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(PipelineError::InvalidInput(format!(
            "Minutes must be between {MIN_MINUTES} and {MAX_MINUTES}, got {minutes}"
        )))
    }
}

/// Chunks for cleaned script text; one chunk when it fits under the ceiling
/// chosen for its length and target duration.
pub fn plan_chunks(cleaned: &str, target_minutes: u32) -> Vec<TextChunk> {
    let length = cleaned.chars().count();
    let ceiling = chunk_ceiling(length, f64::from(target_minutes));
    if length <= ceiling {
        return vec![TextChunk::new(0, cleaned)];
    }
    split_into_chunks(cleaned, ceiling)
}

/// Filesystem and network settings shared by the audio stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSettings {
    pub temp_dir: Option<PathBuf>,
    pub music_dir: Option<PathBuf>,
    pub allow_private_music_urls: bool,
}

/// Composes generation, synthesis, assembly and mixing.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    convergence: DurationConvergenceController,
    assembler: AudioAssembler,
    mixer: BackgroundMixer,
    mood_table: MoodMusicTable,
}

impl PipelineOrchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        transcoder: Arc<dyn Transcoder>,
        settings: PipelineSettings,
    ) -> Self {
        let assembler = AudioAssembler::new(synthesizer, transcoder.clone())
            .with_temp_root(settings.temp_dir.clone())
            .with_bitrate(OUTPUT_BITRATE);
        let mixer = BackgroundMixer::new(
            transcoder,
            MusicFetcher::new(settings.allow_private_music_urls),
        )
        .with_temp_root(settings.temp_dir)
        .with_bitrate(OUTPUT_BITRATE);

        Self {
            convergence: DurationConvergenceController::new(generator),
            assembler,
            mixer,
            mood_table: MoodMusicTable::new(settings.music_dir),
        }
    }

    /// Wire the production collaborators from server configuration.
    pub fn from_config(config: &ServerConfig) -> PipelineResult<Self> {
        let generator = OpenAIGenerator::new(OpenAIGeneratorConfig {
            api_key: config.openai_api_key.clone().unwrap_or_default(),
            base_url: config.openai_base_url.clone(),
            model: config.llm_model.clone(),
        })?;

        let synthesizer = UnrealSpeechTTS::new(UnrealSpeechConfig {
            api_key: config.unreal_speech_api_key.clone().unwrap_or_default(),
            endpoint: config.unreal_speech_url.clone(),
            voice_id: config.voice_id.clone(),
            bitrate: config.tts_bitrate.clone(),
            ..Default::default()
        })?;

        let transcoder = FfmpegTranscoder::new(&config.ffmpeg_path);

        Ok(Self::new(
            Arc::new(generator),
            Arc::new(synthesizer),
            Arc::new(transcoder),
            PipelineSettings {
                temp_dir: config.temp_dir.clone(),
                music_dir: config.music_dir.clone(),
                allow_private_music_urls: config.allow_private_music_urls,
            },
        ))
    }

    /// Run the whole pipeline for one request.
    pub async fn generate(&self, request: &GenerateRequest) -> PipelineResult<FinalAudio> {
        let topic = sanitize_topic(&request.topic)?;
        let minutes = validate_minutes(request.minutes)?;
        info!(topic = %topic, minutes, "Starting generation");

        let narrative = self.convergence.produce_narrative(&topic, minutes).await?;

        let cleaned = clean_for_speech(&narrative.script_text);
        if cleaned.is_empty() {
            return Err(PipelineError::Generation(TextGenerationError::EmptyContent(
                "script after cleaning".to_string(),
            )));
        }

        let chunks = plan_chunks(&cleaned, minutes);
        info!(
            chars = cleaned.chars().count(),
            chunks = chunks.len(),
            mood = %narrative.mood_label,
            "Script prepared for synthesis"
        );

        let voice = self.assembler.assemble(&chunks).await?;

        if !request.mix.enable_background_music {
            return Ok(voice);
        }

        let default_source = self.mood_table.source_for(narrative.mood_label);
        if request.mix.music_source.is_none() && default_source.is_none() {
            warn!(mood = %narrative.mood_label, "No music source available, returning voice-only");
            return Ok(voice);
        }

        Ok(self.mixer.mix(voice, &request.mix, default_source).await)
    }
}
