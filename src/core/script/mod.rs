mod convergence;
mod generator;
mod mood;
pub mod openai;
pub mod prompts;

pub use convergence::{
    CONVERGENCE_TOLERANCE, DurationConvergenceController, DurationTarget,
    MAX_CONVERGENCE_ATTEMPTS, MAX_TARGET_MINUTES, MIN_TARGET_MINUTES,
};
pub use generator::{NarrativeContent, TextGenerationError, TextGenerationResult, TextGenerator};
pub use mood::MoodLabel;
pub use openai::{OpenAIGenerator, OpenAIGeneratorConfig};
