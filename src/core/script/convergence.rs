//! Duration convergence loop.
//!
//! Generated scripts rarely land on the requested length the first time. The
//! controller measures each script by word count and, when it misses by more
//! than the tolerance, asks again with a target scaled by the miss.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::generator::{NarrativeContent, TextGenerationError, TextGenerationResult, TextGenerator};
use crate::core::text::{count_words, estimate_minutes};

/// Total generator calls per run.
pub const MAX_CONVERGENCE_ATTEMPTS: u32 = 3;

/// Accepted relative error between estimated and requested minutes.
pub const CONVERGENCE_TOLERANCE: f64 = 0.08;

/// The first request is capped lower than the overall bound.
pub const FIRST_ATTEMPT_MAX_MINUTES: u32 = 15;

pub const MIN_TARGET_MINUTES: u32 = 1;
pub const MAX_TARGET_MINUTES: u32 = 20;

/// Floor for the estimate when scaling, so a near-empty script cannot
/// explode the next target.
const MIN_ESTIMATE_FOR_SCALING: f64 = 0.5;

/// Requested duration and the target sent on the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationTarget {
    pub requested_minutes: u32,
    pub current_attempt_minutes: u32,
}

impl DurationTarget {
    pub fn new(requested_minutes: u32) -> Self {
        let requested_minutes = requested_minutes.clamp(MIN_TARGET_MINUTES, MAX_TARGET_MINUTES);
        Self {
            requested_minutes,
            current_attempt_minutes: requested_minutes
                .clamp(MIN_TARGET_MINUTES, FIRST_ATTEMPT_MAX_MINUTES),
        }
    }

    /// `|estimated - requested| / requested`
    pub fn relative_error(&self, estimated_minutes: f64) -> f64 {
        let requested = f64::from(self.requested_minutes);
        (estimated_minutes - requested).abs() / requested
    }

    pub fn is_within_tolerance(&self, estimated_minutes: f64) -> bool {
        self.relative_error(estimated_minutes) <= CONVERGENCE_TOLERANCE
    }

    /// Scale the attempt target by how far the last script missed.
    pub fn adjust(&mut self, estimated_minutes: f64) {
        let scaled = f64::from(self.current_attempt_minutes) * f64::from(self.requested_minutes)
            / estimated_minutes.max(MIN_ESTIMATE_FOR_SCALING);
        self.current_attempt_minutes = (scaled.round() as i64)
            .clamp(i64::from(MIN_TARGET_MINUTES), i64::from(MAX_TARGET_MINUTES))
            as u32;
    }
}

/// Drives the generator until the script length converges on the target.
#[derive(Clone)]
pub struct DurationConvergenceController {
    generator: Arc<dyn TextGenerator>,
}

impl DurationConvergenceController {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generate narrative for `topic` sized to `requested_minutes`.
    ///
    /// Never fails on duration mismatch alone: after the last attempt the
    /// last script is returned as-is. Generator failures propagate.
    pub async fn produce_narrative(
        &self,
        topic: &str,
        requested_minutes: u32,
    ) -> TextGenerationResult<NarrativeContent> {
        let mut target = DurationTarget::new(requested_minutes);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let narrative = self
                .generator
                .generate_narrative(topic, target.current_attempt_minutes)
                .await?;

            if narrative.script_text.trim().is_empty() {
                return Err(TextGenerationError::EmptyContent("script".to_string()));
            }

            let words = count_words(&narrative.script_text);
            let estimated = estimate_minutes(&narrative.script_text);
            let error = target.relative_error(estimated);

            debug!(
                attempt,
                target_minutes = target.current_attempt_minutes,
                words,
                estimated_minutes = estimated,
                relative_error = error,
                "Convergence attempt measured"
            );

            if target.is_within_tolerance(estimated) {
                info!(attempt, words, estimated_minutes = estimated, "Script length converged");
                return Ok(narrative);
            }

            if attempt >= MAX_CONVERGENCE_ATTEMPTS {
                warn!(
                    attempts = attempt,
                    requested_minutes = target.requested_minutes,
                    estimated_minutes = estimated,
                    "Script length did not converge, using last attempt"
                );
                return Ok(narrative);
            }

            target.adjust(estimated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::script::MoodLabel;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns scripts with pre-set word counts and records each target.
    struct ScriptedGenerator {
        word_counts: Vec<usize>,
        requested: Mutex<Vec<u32>>,
    }

    impl ScriptedGenerator {
        fn new(word_counts: Vec<usize>) -> Arc<Self> {
            Arc::new(Self {
                word_counts,
                requested: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate_narrative(
            &self,
            _topic: &str,
            minutes: u32,
        ) -> TextGenerationResult<NarrativeContent> {
            let mut requested = self.requested.lock().unwrap();
            let idx = requested.len().min(self.word_counts.len() - 1);
            requested.push(minutes);
            let text = "word ".repeat(self.word_counts[idx]);
            Ok(NarrativeContent::new(text, MoodLabel::Happy))
        }

        async fn classify_mood(&self, _topic: &str) -> TextGenerationResult<MoodLabel> {
            Ok(MoodLabel::Happy)
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate_narrative(
            &self,
            _topic: &str,
            _minutes: u32,
        ) -> TextGenerationResult<NarrativeContent> {
            Err(TextGenerationError::ProviderError("down".into()))
        }

        async fn classify_mood(&self, _topic: &str) -> TextGenerationResult<MoodLabel> {
            Err(TextGenerationError::ProviderError("down".into()))
        }
    }

    #[test]
    fn test_target_first_attempt_capped() {
        assert_eq!(DurationTarget::new(20).current_attempt_minutes, 15);
        assert_eq!(DurationTarget::new(2).current_attempt_minutes, 2);
        assert_eq!(DurationTarget::new(0).requested_minutes, 1);
    }

    #[test]
    fn test_adjust_scales_and_clamps() {
        let mut target = DurationTarget::new(2);
        // 200 words = 1.333 min; 2 * 2 / 1.333 = 3
        target.adjust(200.0 / 150.0);
        assert_eq!(target.current_attempt_minutes, 3);

        let mut tiny = DurationTarget::new(4);
        // estimate floored at 0.5: 4 * 4 / 0.5 = 32 -> 20
        tiny.adjust(0.1);
        assert_eq!(tiny.current_attempt_minutes, 20);

        let mut long = DurationTarget::new(1);
        long.adjust(10.0);
        assert_eq!(long.current_attempt_minutes, 1);
    }

    #[test]
    fn test_tolerance_boundary() {
        let target = DurationTarget::new(10);
        assert!(target.is_within_tolerance(10.75));
        assert!(target.is_within_tolerance(9.25));
        assert!(!target.is_within_tolerance(10.85));
    }

    #[tokio::test]
    async fn test_accepts_first_script_within_tolerance() {
        let generator = ScriptedGenerator::new(vec![300]);
        let controller = DurationConvergenceController::new(generator.clone());

        let narrative = controller.produce_narrative("Tides", 2).await.unwrap();

        assert_eq!(count_words(&narrative.script_text), 300);
        assert_eq!(generator.calls(), vec![2]);
    }

    #[tokio::test]
    async fn test_regenerates_with_adjusted_target() {
        let generator = ScriptedGenerator::new(vec![200, 310]);
        let controller = DurationConvergenceController::new(generator.clone());

        let narrative = controller.produce_narrative("Tides", 2).await.unwrap();

        assert_eq!(count_words(&narrative.script_text), 310);
        assert_eq!(generator.calls(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_returns_last_after_three_attempts() {
        let generator = ScriptedGenerator::new(vec![100, 120, 140, 999]);
        let controller = DurationConvergenceController::new(generator.clone());

        let narrative = controller.produce_narrative("Tides", 5).await.unwrap();

        assert_eq!(generator.calls().len(), 3);
        assert_eq!(count_words(&narrative.script_text), 140);
    }

    #[tokio::test]
    async fn test_all_targets_terminate_within_budget() {
        for minutes in 1..=20 {
            let generator = ScriptedGenerator::new(vec![37]);
            let controller = DurationConvergenceController::new(generator.clone());
            let narrative = controller.produce_narrative("Tides", minutes).await.unwrap();

            assert!(!narrative.script_text.trim().is_empty());
            let calls = generator.calls();
            assert!(calls.len() <= 3);
            assert!(calls.iter().all(|m| (1..=20).contains(m)));
        }
    }

    #[tokio::test]
    async fn test_generator_error_propagates() {
        let controller = DurationConvergenceController::new(Arc::new(FailingGenerator));
        let err = controller.produce_narrative("Tides", 2).await.unwrap_err();
        assert!(matches!(err, TextGenerationError::ProviderError(_)));
    }

    #[tokio::test]
    async fn test_empty_script_is_an_error() {
        let generator = ScriptedGenerator::new(vec![0]);
        let controller = DurationConvergenceController::new(generator);
        let err = controller.produce_narrative("Tides", 2).await.unwrap_err();
        assert!(matches!(err, TextGenerationError::EmptyContent(_)));
    }
}
