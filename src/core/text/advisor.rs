//! Chunk size ceiling selection.
//!
//! The synthesis provider accepts at most [`BASE_CHUNK_SIZE`] characters per
//! request. Within that limit the ceiling is tuned to how the script length
//! compares with what the target duration would normally need: short scripts
//! use fewer, larger chunks and long scripts use smaller, evenly sized ones.

use tracing::debug;

/// Provider character limit per synthesis request.
pub const BASE_CHUNK_SIZE: usize = 3000;

/// Reference rate for sizing: ~150 words per minute at ~5 characters per word.
pub const CHARS_PER_MINUTE: f64 = 750.0;

/// Floor for the ceiling when the script is much longer than expected.
const MIN_LONG_TEXT_CEILING: f64 = 1500.0;

/// Compute the chunk ceiling for a script of `text_length` characters that
/// should last `target_minutes`.
pub fn chunk_ceiling(text_length: usize, target_minutes: f64) -> usize {
    let base = BASE_CHUNK_SIZE as f64;
    let expected = target_minutes * CHARS_PER_MINUTE;

    if expected <= 0.0 {
        return BASE_CHUNK_SIZE;
    }

    let ratio = text_length as f64 / expected;

    let ceiling = if ratio <= 0.5 {
        (base * 1.5).min(text_length as f64)
    } else if ratio >= 2.0 {
        (base * 0.7).max(MIN_LONG_TEXT_CEILING)
    } else {
        base
    };

    let ceiling = ceiling.min(base).floor() as usize;

    debug!(
        text_length,
        expected_chars = expected,
        ratio,
        ceiling,
        "Computed chunk ceiling"
    );

    ceiling
}
