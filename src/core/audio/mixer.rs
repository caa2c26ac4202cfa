//! Background music bed mixing.
//!
//! The bed is looped past the voice length, trimmed to it, band-limited away
//! from the speech range, faded, leveled and optionally ducked under the
//! voice before the final loudness pass. Mixing is best-effort: any failure
//! hands back the voice track untouched.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::graph::{FilterGraph, FilterStage, OutputSpec, TranscodeJob};
use super::music::{MusicFetcher, MusicSource};
use super::transcoder::{Transcoder, wav_duration_secs};
use super::workspace::RunWorkspace;
use super::{AudioError, AudioResult, FinalAudio, OUTPUT_BITRATE};

/// Default static gain applied to the bed.
pub const DEFAULT_LEVEL_DB: f64 = -18.0;

const HIGHPASS_HZ: u32 = 120;
const LOWPASS_HZ: u32 = 8000;
const FADE_IN_SECS: f64 = 2.0;
const FADE_OUT_SECS: f64 = 1.5;

/// Shortest loop length used when sizing the bed.
const MIN_LOOP_SECS: f64 = 0.1;

fn default_level_db() -> f64 {
    DEFAULT_LEVEL_DB
}

/// Per-run mixing options. Read-only for the mixer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixOptions {
    #[serde(default, alias = "backgroundMusic")]
    pub enable_background_music: bool,

    /// Local path, `file://` URL or `http(s)://` URL; the mood table is used
    /// when absent
    #[serde(default, alias = "bgmUrl")]
    pub music_source: Option<String>,

    #[serde(default = "default_level_db", alias = "bgmVolumeDb")]
    pub level_db: f64,

    #[serde(default, alias = "ducking")]
    pub enable_ducking: bool,
}

impl Default for MixOptions {
    fn default() -> Self {
        Self {
            enable_background_music: false,
            music_source: None,
            level_db: DEFAULT_LEVEL_DB,
            enable_ducking: false,
        }
    }
}

/// Copies of the music loop needed to cover `voice_secs`, plus one spare.
pub fn loop_repeats(voice_secs: f64, music_secs: f64) -> usize {
    let per_loop = music_secs.max(MIN_LOOP_SECS);
    ((voice_secs / per_loop).ceil() as usize + 1).max(1)
}

/// Mix graph over input 0 (voice PCM) and input 1 (looped bed PCM).
///
/// Writes pad `mixed`.
pub fn build_mix_graph(voice_secs: f64, level_db: f64, ducking: bool) -> FilterGraph {
    let fade_out_start = (voice_secs - FADE_OUT_SECS).max(0.0);

    let mut graph = FilterGraph::new()
        .stage(
            FilterStage::new(format!("atrim=duration={voice_secs:.3}"))
                .input("1:a")
                .output("m1"),
        )
        .stage(
            FilterStage::new(format!("highpass=f={HIGHPASS_HZ}"))
                .input("m1")
                .output("m2"),
        )
        .stage(
            FilterStage::new(format!("lowpass=f={LOWPASS_HZ}"))
                .input("m2")
                .output("m3"),
        )
        .stage(
            FilterStage::new(format!("afade=t=in:st=0:d={FADE_IN_SECS}"))
                .input("m3")
                .output("m4"),
        )
        .stage(
            FilterStage::new(format!(
                "afade=t=out:st={fade_out_start:.3}:d={FADE_OUT_SECS}"
            ))
            .input("m4")
            .output("m5"),
        )
        .stage(
            FilterStage::new(format!("volume={level_db}dB"))
                .input("m5")
                .output("music_vol"),
        );

    let bed = if ducking {
        graph = graph.stage(
            FilterStage::new("sidechaincompress=threshold=0.03:ratio=8:attack=5:release=200:makeup=0")
                .input("music_vol")
                .input("0:a")
                .output("ducked"),
        );
        "ducked"
    } else {
        "music_vol"
    };

    graph
        .stage(
            FilterStage::new("amix=inputs=2:dropout_transition=3")
                .input("0:a")
                .input(bed)
                .output("mixed1"),
        )
        .stage(
            FilterStage::new("dynaudnorm=f=150:g=15:m=15")
                .input("mixed1")
                .output("mixed2"),
        )
        .stage(
            FilterStage::new("loudnorm=I=-16:TP=-1.5:LRA=11")
                .input("mixed2")
                .output("mixed"),
        )
}

/// Lays a music bed under a voice track.
#[derive(Clone)]
pub struct BackgroundMixer {
    transcoder: Arc<dyn Transcoder>,
    fetcher: MusicFetcher,
    temp_root: Option<PathBuf>,
    bitrate: String,
}

impl BackgroundMixer {
    pub fn new(transcoder: Arc<dyn Transcoder>, fetcher: MusicFetcher) -> Self {
        Self {
            transcoder,
            fetcher,
            temp_root: None,
            bitrate: OUTPUT_BITRATE.to_string(),
        }
    }

    pub fn with_temp_root(mut self, root: Option<PathBuf>) -> Self {
        self.temp_root = root;
        self
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }

    /// Mix `voice` with the bed from `options`, or `default_source` when the
    /// options name none. Never fails: on any error the voice comes back
    /// unchanged.
    pub async fn mix(
        &self,
        voice: FinalAudio,
        options: &MixOptions,
        default_source: Option<MusicSource>,
    ) -> FinalAudio {
        match self.try_mix(&voice, options, default_source).await {
            Ok(mixed) => mixed,
            Err(e) => {
                let degraded = AudioError::MixingDegraded(e.to_string());
                warn!(error = %degraded, "Background mixing failed, returning voice-only audio");
                voice
            }
        }
    }

    /// Fallible mix used by [`Self::mix`].
    pub async fn try_mix(
        &self,
        voice: &FinalAudio,
        options: &MixOptions,
        default_source: Option<MusicSource>,
    ) -> AudioResult<FinalAudio> {
        let source = match options.music_source.as_deref() {
            Some(raw) => MusicSource::parse(raw)?,
            None => default_source.ok_or_else(|| {
                AudioError::MusicUnavailable("no music source configured".to_string())
            })?,
        };

        let music = self.fetcher.fetch(&source).await?;
        let workspace = RunWorkspace::create(self.temp_root.as_deref()).await?;

        let voice_encoded = workspace.write("voice.mp3", &voice.data).await?;
        let music_encoded = workspace.write("music.src", &music).await?;
        let voice_pcm = workspace.file("voice.wav");
        let music_pcm = workspace.file("music.wav");

        self.transcoder
            .run(&TranscodeJob::convert(voice_encoded, voice_pcm.clone(), OutputSpec::Pcm))
            .await?;
        self.transcoder
            .run(&TranscodeJob::convert(music_encoded, music_pcm.clone(), OutputSpec::Pcm))
            .await?;

        let voice_secs = wav_duration_secs(&voice_pcm)?;
        let music_secs = wav_duration_secs(&music_pcm)?;
        if voice_secs <= 0.0 {
            return Err(AudioError::MixingDegraded("voice track has no duration".to_string()));
        }

        let repeats = loop_repeats(voice_secs, music_secs);
        info!(voice_secs, music_secs, repeats, "Building music bed");

        let bed_pcm = workspace.file("bed.wav");
        let bed_graph = FilterGraph::new().stage(
            (0..repeats).fold(
                FilterStage::new(format!("concat=n={repeats}:v=0:a=1")).output("bed"),
                |stage, i| stage.input(format!("{i}:a")),
            ),
        );
        self.transcoder
            .run(&TranscodeJob::filtered(
                vec![music_pcm; repeats],
                bed_graph,
                "bed",
                bed_pcm.clone(),
                OutputSpec::Pcm,
            ))
            .await?;

        let mixed = workspace.file("mixed.mp3");
        self.transcoder
            .run(&TranscodeJob::filtered(
                vec![voice_pcm, bed_pcm],
                build_mix_graph(voice_secs, options.level_db, options.enable_ducking),
                "mixed",
                mixed.clone(),
                OutputSpec::Mp3 {
                    bitrate: self.bitrate.clone(),
                },
            ))
            .await?;

        let data = workspace.read(&mixed).await?;
        info!(
            bytes = data.len(),
            ducking = options.enable_ducking,
            level_db = options.level_db,
            "Background music mixed"
        );
        Ok(FinalAudio::mp3(data))
    }
}
