//! Explicit description of one transcoder invocation.
//!
//! A job is a list of input files, an optional filter graph built from named
//! stages, and one output. It is rendered to a command line exactly once.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use super::{CHANNELS, SAMPLE_RATE};

/// One filter with named input and output pads.
///
/// Renders as `[in1][in2]filter[out]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStage {
    pub inputs: Vec<String>,
    pub filter: String,
    pub outputs: Vec<String>,
}

impl FilterStage {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            inputs: Vec::new(),
            filter: filter.into(),
            outputs: Vec::new(),
        }
    }

    pub fn input(mut self, pad: impl Into<String>) -> Self {
        self.inputs.push(pad.into());
        self
    }

    pub fn output(mut self, pad: impl Into<String>) -> Self {
        self.outputs.push(pad.into());
        self
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in &self.inputs {
            write!(f, "[{pad}]")?;
        }
        f.write_str(&self.filter)?;
        for pad in &self.outputs {
            write!(f, "[{pad}]")?;
        }
        Ok(())
    }
}

/// Ordered list of stages joined into a `-filter_complex` argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterGraph {
    stages: Vec<FilterStage>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: FilterStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Find the first stage whose filter starts with `name`.
    pub fn find(&self, name: &str) -> Option<&FilterStage> {
        self.stages.iter().find(|s| s.filter.starts_with(name))
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}

/// Encoding of the job's output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSpec {
    /// Normalized intermediate: s16le WAV at the shared rate and layout
    Pcm,
    /// Final MP3 encode
    Mp3 { bitrate: String },
}

impl OutputSpec {
    fn codec_args(&self) -> Vec<String> {
        let mut args = match self {
            OutputSpec::Pcm => vec!["-acodec".to_string(), "pcm_s16le".to_string()],
            OutputSpec::Mp3 { bitrate } => vec![
                "-acodec".to_string(),
                "libmp3lame".to_string(),
                "-b:a".to_string(),
                bitrate.clone(),
            ],
        };
        args.extend([
            "-ar".to_string(),
            SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            CHANNELS.to_string(),
            "-f".to_string(),
            match self {
                OutputSpec::Pcm => "wav".to_string(),
                OutputSpec::Mp3 { .. } => "mp3".to_string(),
            },
        ]);
        args
    }
}

/// A complete transcoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub inputs: Vec<PathBuf>,
    pub graph: Option<FilterGraph>,
    /// Output pad of `graph` to write; ignored without a graph
    pub map: Option<String>,
    pub output: PathBuf,
    pub spec: OutputSpec,
}

impl TranscodeJob {
    /// Plain format conversion of one file.
    pub fn convert(input: PathBuf, output: PathBuf, spec: OutputSpec) -> Self {
        Self {
            inputs: vec![input],
            graph: None,
            map: None,
            output,
            spec,
        }
    }

    /// Run `graph` over `inputs` and write pad `map`.
    pub fn filtered(
        inputs: Vec<PathBuf>,
        graph: FilterGraph,
        map: impl Into<String>,
        output: PathBuf,
        spec: OutputSpec,
    ) -> Self {
        Self {
            inputs,
            graph: Some(graph),
            map: Some(map.into()),
            output,
            spec,
        }
    }

    /// Command-line arguments, excluding the binary itself.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-nostdin", "-y"]
            .into_iter()
            .map(OsString::from)
            .collect();

        for input in &self.inputs {
            args.push("-i".into());
            args.push(input.clone().into_os_string());
        }

        if let Some(graph) = self.graph.as_ref().filter(|g| !g.is_empty()) {
            args.push("-filter_complex".into());
            args.push(graph.to_string().into());
            if let Some(pad) = &self.map {
                args.push("-map".into());
                args.push(format!("[{pad}]").into());
            }
        }

        args.extend(self.spec.codec_args().into_iter().map(OsString::from));
        args.push(self.output.clone().into_os_string());
        args
    }
}
