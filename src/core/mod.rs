pub mod audio;
pub mod pipeline;
pub mod retry;
pub mod script;
pub mod text;
pub mod tts;

// Re-export commonly used types for convenience
pub use audio::{AudioError, FinalAudio, MixOptions};
pub use pipeline::{
    GenerateRequest, PipelineError, PipelineOrchestrator, PipelineResult, PipelineSettings,
};
pub use retry::{ChunkRetry, RateLimitPolicy};
pub use script::{MoodLabel, NarrativeContent, TextGenerator};
pub use tts::{SpeechSynthesizer, SynthesisError};
