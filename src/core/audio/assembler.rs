use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use super::graph::{FilterGraph, FilterStage, OutputSpec, TranscodeJob};
use super::transcoder::Transcoder;
use super::workspace::RunWorkspace;
use super::{AudioError, AudioResult, FinalAudio, OUTPUT_BITRATE};
use crate::core::retry::ChunkRetry;
use crate::core::text::TextChunk;
use crate::core::tts::{AudioSegment, SpeechSynthesizer, SynthesisError};

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No text chunks to synthesize")]
    NoChunks,

    /// A chunk spent its retry budget; nothing is assembled
    #[error("Chunk {chunk_index} failed after {attempts} attempts: {source}")]
    IncompleteSynthesis {
        chunk_index: usize,
        attempts: u32,
        #[source]
        source: SynthesisError,
    },

    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Filter graph joining `n` PCM inputs end to end.
pub(crate) fn concat_graph(n: usize) -> FilterGraph {
    let stage = (0..n).fold(
        FilterStage::new(format!("concat=n={n}:v=0:a=1")).output("out"),
        |stage, i| stage.input(format!("{i}:a")),
    );
    FilterGraph::new().stage(stage)
}

/// Synthesizes chunks one at a time and joins them into one encode.
#[derive(Clone)]
pub struct AudioAssembler {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcoder: Arc<dyn Transcoder>,
    chunk_retry: ChunkRetry,
    temp_root: Option<PathBuf>,
    bitrate: String,
}

impl AudioAssembler {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            synthesizer,
            transcoder,
            chunk_retry: ChunkRetry::default(),
            temp_root: None,
            bitrate: OUTPUT_BITRATE.to_string(),
        }
    }

    pub fn with_chunk_retry(mut self, retry: ChunkRetry) -> Self {
        self.chunk_retry = retry;
        self
    }

    /// Parent directory for per-run workspaces.
    pub fn with_temp_root(mut self, root: Option<PathBuf>) -> Self {
        self.temp_root = root;
        self
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }

    async fn synthesize_chunk(&self, chunk: &TextChunk) -> Result<AudioSegment, AssemblyError> {
        let operation = format!("synthesize.chunk_{}", chunk.sequence_index);
        self.chunk_retry
            .run(&operation, |_| self.synthesizer.synthesize(&chunk.text))
            .await
            .map(|data| AudioSegment::new(chunk.sequence_index, data))
            .map_err(|source| {
                error!(
                    chunk_index = chunk.sequence_index,
                    provider = self.synthesizer.provider_name(),
                    error = %source,
                    "Chunk synthesis failed permanently"
                );
                AssemblyError::IncompleteSynthesis {
                    chunk_index: chunk.sequence_index,
                    attempts: self.chunk_retry.attempts.max(1),
                    source,
                }
            })
    }

    /// Synthesize every chunk strictly in order, stopping at the first chunk
    /// that fails permanently.
    pub async fn synthesize_all(
        &self,
        chunks: &[TextChunk],
    ) -> Result<Vec<AudioSegment>, AssemblyError> {
        let mut segments = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let segment = self.synthesize_chunk(chunk).await?;
            info!(
                chunk_index = chunk.sequence_index,
                total = chunks.len(),
                bytes = segment.len(),
                "Chunk synthesized"
            );
            segments.push(segment);
        }
        Ok(segments)
    }

    /// Turn ordered chunks into one encoded voice track.
    ///
    /// A single chunk is returned as the provider encoded it. It gets the same
    /// per-chunk retry budget as the multi-chunk loop, so a one-chunk script
    /// survives the same transient failures a longer one would. Several chunks
    /// are normalized to PCM, concatenated in order and encoded once. Any
    /// permanently failed chunk aborts the whole assembly.
    pub async fn assemble(&self, chunks: &[TextChunk]) -> Result<FinalAudio, AssemblyError> {
        match chunks {
            [] => Err(AssemblyError::NoChunks),
            [single] => {
                let segment = self.synthesize_chunk(single).await?;
                Ok(FinalAudio::mp3(segment.data))
            }
            _ => {
                let segments = self.synthesize_all(chunks).await?;
                Ok(self.concatenate(&segments).await?)
            }
        }
    }

    async fn concatenate(&self, segments: &[AudioSegment]) -> AudioResult<FinalAudio> {
        let workspace = RunWorkspace::create(self.temp_root.as_deref()).await?;

        let mut pcm_inputs = Vec::with_capacity(segments.len());
        for segment in segments {
            let encoded = workspace
                .write(&format!("seg_{:04}.mp3", segment.sequence_index), &segment.data)
                .await?;
            let pcm = workspace.file(&format!("seg_{:04}.wav", segment.sequence_index));
            self.transcoder
                .run(&TranscodeJob::convert(encoded, pcm.clone(), OutputSpec::Pcm))
                .await?;
            pcm_inputs.push(pcm);
        }

        let output = workspace.file("voice.mp3");
        let job = TranscodeJob::filtered(
            pcm_inputs,
            concat_graph(segments.len()),
            "out",
            output.clone(),
            OutputSpec::Mp3 {
                bitrate: self.bitrate.clone(),
            },
        );
        self.transcoder.run(&job).await?;

        let data = workspace.read(&output).await?;
        info!(segments = segments.len(), bytes = data.len(), "Voice track assembled");
        Ok(FinalAudio::mp3(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::testing::FakeTranscoder;
    use crate::core::tts::SynthesisResult;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Returns each chunk's text length as its "duration" and can fail a
    /// chosen chunk a number of times.
    #[derive(Default)]
    struct FakeSynthesizer {
        calls: Mutex<Vec<String>>,
        failures: Mutex<HashMap<String, u32>>,
    }

    impl FakeSynthesizer {
        fn failing(text: &str, times: u32) -> Self {
            let synth = Self::default();
            synth.failures.lock().unwrap().insert(text.to_string(), times);
            synth
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn synthesize(&self, text: &str) -> SynthesisResult<Bytes> {
            self.calls.lock().unwrap().push(text.to_string());
            let mut failures = self.failures.lock().unwrap();
            if let Some(left) = failures.get_mut(text).filter(|left| **left > 0) {
                *left -= 1;
                return Err(SynthesisError::DownloadFailed("connection reset".into()));
            }
            Ok(Bytes::from(format!("{}", text.len())))
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextChunk::new(i, *t))
            .collect()
    }

    fn fast_retry() -> ChunkRetry {
        ChunkRetry {
            attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    fn assembler(
        synth: Arc<FakeSynthesizer>,
        transcoder: Arc<FakeTranscoder>,
        root: &TempDir,
    ) -> AudioAssembler {
        AudioAssembler::new(synth, transcoder)
            .with_chunk_retry(fast_retry())
            .with_temp_root(Some(root.path().to_path_buf()))
    }

    #[test]
    fn test_concat_graph() {
        assert_eq!(
            concat_graph(3).to_string(),
            "[0:a][1:a][2:a]concat=n=3:v=0:a=1[out]"
        );
    }

    #[tokio::test]
    async fn test_single_chunk_skips_assembly() {
        let root = TempDir::new().unwrap();
        let synth = Arc::new(FakeSynthesizer::default());
        let transcoder = Arc::new(FakeTranscoder::default());

        let audio = assembler(synth.clone(), transcoder.clone(), &root)
            .assemble(&chunks(&["Hello there."]))
            .await
            .unwrap();

        assert_eq!(audio.data, Bytes::from("12"));
        assert_eq!(audio.mime_type, "audio/mpeg");
        assert!(transcoder.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_multi_chunk_concatenates_in_order() {
        let root = TempDir::new().unwrap();
        let synth = Arc::new(FakeSynthesizer::default());
        let transcoder = Arc::new(FakeTranscoder::default());

        let audio = assembler(synth.clone(), transcoder.clone(), &root)
            .assemble(&chunks(&["aa", "bbbb", "cccccc"]))
            .await
            .unwrap();

        assert_eq!(synth.calls(), vec!["aa", "bbbb", "cccccc"]);
        // 2 + 4 + 6 "seconds"
        assert_eq!(audio.data, Bytes::from("mp3:12.000"));

        let jobs = transcoder.jobs();
        assert_eq!(jobs.len(), 4);
        let concat = jobs.last().unwrap();
        let names: Vec<String> = concat
            .inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["seg_0000.wav", "seg_0001.wav", "seg_0002.wav"]);
        assert_eq!(
            concat.spec,
            OutputSpec::Mp3 {
                bitrate: "320k".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let root = TempDir::new().unwrap();
        let synth = Arc::new(FakeSynthesizer::failing("bbbb", 2));
        let transcoder = Arc::new(FakeTranscoder::default());

        let result = assembler(synth.clone(), transcoder, &root)
            .assemble(&chunks(&["aa", "bbbb"]))
            .await;

        assert!(result.is_ok());
        assert_eq!(synth.calls(), vec!["aa", "bbbb", "bbbb", "bbbb"]);
    }

    #[tokio::test]
    async fn test_permanent_failure_aborts_without_artifacts() {
        let root = TempDir::new().unwrap();
        let synth = Arc::new(FakeSynthesizer::failing("bbbb", 10));
        let transcoder = Arc::new(FakeTranscoder::default());

        let err = assembler(synth.clone(), transcoder.clone(), &root)
            .assemble(&chunks(&["aa", "bbbb", "cccccc"]))
            .await
            .unwrap_err();

        match err {
            AssemblyError::IncompleteSynthesis {
                chunk_index,
                attempts,
                ..
            } => {
                assert_eq!(chunk_index, 1);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected IncompleteSynthesis, got {other:?}"),
        }
        // later chunks never requested, nothing transcoded or written
        assert!(!synth.calls().contains(&"cccccc".to_string()));
        assert!(transcoder.jobs().is_empty());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_single_chunk_transient_failure_is_retried() {
        let root = TempDir::new().unwrap();
        let synth = Arc::new(FakeSynthesizer::failing("only", 2));
        let transcoder = Arc::new(FakeTranscoder::default());

        let audio = assembler(synth.clone(), transcoder.clone(), &root)
            .assemble(&chunks(&["only"]))
            .await
            .unwrap();

        assert_eq!(audio.data, Bytes::from("4"));
        assert_eq!(synth.calls(), vec!["only", "only", "only"]);
        assert!(transcoder.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_single_chunk_failure_reports_index_zero() {
        let root = TempDir::new().unwrap();
        let synth = Arc::new(FakeSynthesizer::failing("only", 10));
        let transcoder = Arc::new(FakeTranscoder::default());

        let err = assembler(synth, transcoder, &root)
            .assemble(&chunks(&["only"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::IncompleteSynthesis { chunk_index: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_repeat_assembly_keeps_segment_order() {
        let root = TempDir::new().unwrap();
        let synth = Arc::new(FakeSynthesizer::default());
        let transcoder = Arc::new(FakeTranscoder::default());
        let assembler = assembler(synth.clone(), transcoder.clone(), &root);
        let input = chunks(&["one", "two", "three"]);

        let first = assembler.assemble(&input).await.unwrap();
        let second = assembler.assemble(&input).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            synth.calls(),
            vec!["one", "two", "three", "one", "two", "three"]
        );
        // workspaces are gone after each run
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_transcoder_failure_is_audio_error() {
        let root = TempDir::new().unwrap();
        let synth = Arc::new(FakeSynthesizer::default());
        let transcoder = Arc::new(FakeTranscoder::failing_when(|job| job.graph.is_some()));

        let err = assembler(synth, transcoder, &root)
            .assemble(&chunks(&["aa", "bb"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AssemblyError::Audio(_)));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let root = TempDir::new().unwrap();
        let err = assembler(
            Arc::new(FakeSynthesizer::default()),
            Arc::new(FakeTranscoder::default()),
            &root,
        )
        .assemble(&[])
        .await
        .unwrap_err();
        assert!(matches!(err, AssemblyError::NoChunks));
    }
}
