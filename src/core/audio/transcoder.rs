use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error};

use super::graph::TranscodeJob;
use super::{AudioError, AudioResult};

/// Upper bound for one transcoder run.
const TRANSCODE_TIMEOUT: Duration = Duration::from_secs(300);

/// Keep only the end of stderr in errors; ffmpeg puts the cause last.
const STDERR_TAIL_CHARS: usize = 2000;

/// Executes [`TranscodeJob`]s.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn run(&self, job: &TranscodeJob) -> AudioResult<()>;
}

/// Runs jobs through an `ffmpeg` child process.
///
/// The child is killed when the run future is dropped, so cancelling a
/// pipeline run never leaves an orphan encoder behind.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: TRANSCODE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        text.to_string()
    } else {
        text.chars().skip(count - STDERR_TAIL_CHARS).collect()
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn run(&self, job: &TranscodeJob) -> AudioResult<()> {
        let args = job.to_args();
        debug!(
            binary = %self.binary.display(),
            inputs = job.inputs.len(),
            output = %job.output.display(),
            "Running transcoder"
        );

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AudioError::TranscoderUnavailable {
                binary: self.binary.display().to_string(),
                reason: e.to_string(),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AudioError::TranscodeTimeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr);
            error!(status = %output.status, stderr = %stderr, "Transcoder failed");
            return Err(AudioError::TranscodeFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(())
    }
}

/// Duration in seconds of a PCM WAV artifact.
pub fn wav_duration_secs(path: &Path) -> AudioResult<f64> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Ok(0.0);
    }
    // duration() counts frames, independent of channel count
    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}
