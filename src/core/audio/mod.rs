//! Audio assembly and mixing.
//!
//! Every intermediate artifact is normalized to one PCM representation
//! (signed 16-bit little-endian WAV, 44.1 kHz, stereo) so that segments from
//! independent encoder runs join without boundary artifacts. The final
//! artifact is encoded once as MP3.

mod assembler;
mod graph;
mod mixer;
mod music;
mod transcoder;
mod workspace;

#[doc(hidden)]
pub mod testing;

use bytes::Bytes;
use thiserror::Error;

pub use assembler::{AssemblyError, AudioAssembler};
pub use graph::{FilterGraph, FilterStage, OutputSpec, TranscodeJob};
pub use mixer::{BackgroundMixer, MixOptions, build_mix_graph, loop_repeats};
pub use music::{MoodMusicTable, MusicFetcher, MusicSource};
pub use transcoder::{FfmpegTranscoder, Transcoder, wav_duration_secs};
pub use workspace::RunWorkspace;

/// Sample rate of every intermediate PCM artifact.
pub const SAMPLE_RATE: u32 = 44_100;

/// Channel count of every intermediate PCM artifact.
pub const CHANNELS: u16 = 2;

/// Bitrate of the single final encode.
pub const OUTPUT_BITRATE: &str = "320k";

/// Content type of [`FinalAudio`].
pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start transcoder '{binary}': {reason}")]
    TranscoderUnavailable { binary: String, reason: String },

    #[error("Transcoding failed ({status}): {stderr}")]
    TranscodeFailed { status: String, stderr: String },

    #[error("Transcoding timed out after {0}s")]
    TranscodeTimeout(u64),

    #[error("Invalid PCM artifact: {0}")]
    InvalidPcm(#[from] hound::Error),

    #[error("Music source unavailable: {0}")]
    MusicUnavailable(String),

    /// Mixing failed and voice-only audio is used instead
    #[error("Mixing degraded to voice-only: {0}")]
    MixingDegraded(String),
}

pub type AudioResult<T> = Result<T, AudioError>;

/// Terminal encoded artifact of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalAudio {
    pub data: Bytes,
    pub mime_type: &'static str,
}

impl FinalAudio {
    pub fn mp3(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime_type: AUDIO_MIME_TYPE,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
