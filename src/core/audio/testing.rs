//! In-process stand-in for ffmpeg, shared by unit and integration tests.
//!
//! Inputs are either WAV files or text files holding a duration in seconds
//! (what fake synthesizers return). PCM outputs are real WAV files with the
//! computed duration so [`wav_duration_secs`] works on them; MP3 outputs are
//! `mp3:<secs>` text. A concat graph sums its input durations; any other job
//! takes the duration of its first input.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::graph::{OutputSpec, TranscodeJob};
use super::transcoder::{Transcoder, wav_duration_secs};
use super::{AudioError, AudioResult};

const FAKE_RATE: u32 = 1000;

/// Seconds of audio in `path`: a WAV file, or text holding seconds
/// (optionally `mp3:`-prefixed).
pub fn input_secs(path: &Path) -> AudioResult<f64> {
    if let Ok(secs) = wav_duration_secs(path) {
        return Ok(secs);
    }
    let text = std::fs::read_to_string(path)?;
    text.trim()
        .trim_start_matches("mp3:")
        .parse::<f64>()
        .map_err(|_| AudioError::TranscodeFailed {
            status: "exit status: 1".to_string(),
            stderr: format!("Invalid data found when processing input {}", path.display()),
        })
}

/// Write a silent mono WAV lasting `secs`.
pub fn write_wav(path: &Path, secs: f64) -> AudioResult<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: FAKE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for _ in 0..(secs * f64::from(FAKE_RATE)).round() as u64 {
        writer.write_sample(0i16)?;
    }
    writer.finalize()?;
    Ok(())
}

type FailWhen = Box<dyn Fn(&TranscodeJob) -> bool + Send + Sync>;

/// Records every job and simulates its output.
#[derive(Default)]
pub struct FakeTranscoder {
    jobs: Mutex<Vec<TranscodeJob>>,
    fail_when: Option<FailWhen>,
}

impl FakeTranscoder {
    /// Fail every job matching `pred` the way a non-zero ffmpeg exit would.
    pub fn failing_when(pred: impl Fn(&TranscodeJob) -> bool + Send + Sync + 'static) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            fail_when: Some(Box::new(pred)),
        }
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<TranscodeJob>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn jobs(&self) -> Vec<TranscodeJob> {
        self.recorded().clone()
    }

    /// Rendered filter graphs of every filtered job, in run order.
    pub fn rendered_graphs(&self) -> Vec<String> {
        self.recorded()
            .iter()
            .filter_map(|job| job.graph.as_ref().map(|g| g.to_string()))
            .collect()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn run(&self, job: &TranscodeJob) -> AudioResult<()> {
        self.recorded().push(job.clone());

        if self.fail_when.as_ref().is_some_and(|f| f(job)) {
            return Err(AudioError::TranscodeFailed {
                status: "exit status: 1".to_string(),
                stderr: "simulated failure".to_string(),
            });
        }

        let durations = job
            .inputs
            .iter()
            .map(|p| input_secs(p))
            .collect::<AudioResult<Vec<_>>>()?;

        let is_concat = job
            .graph
            .as_ref()
            .is_some_and(|g| g.find("concat").is_some());
        let secs = if is_concat {
            durations.iter().sum()
        } else {
            durations.first().copied().unwrap_or(0.0)
        };

        match job.spec {
            OutputSpec::Pcm => write_wav(&job.output, secs)?,
            OutputSpec::Mp3 { .. } => std::fs::write(&job.output, format!("mp3:{secs:.3}"))?,
        }
        Ok(())
    }
}
