//! Word counting and spoken-duration estimation.

/// Reference narration rate used to estimate the spoken length of a script.
///
/// Independent of the 180 wpm prompt target and the 750 chars/min chunk
/// sizing rate.
pub const ESTIMATION_WORDS_PER_MINUTE: f64 = 150.0;

/// Count contiguous alphanumeric runs. Punctuation-only tokens do not count.
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;

    for c in text.chars() {
        let is_word_char = c.is_alphanumeric() || c == '_';
        if is_word_char && !in_word {
            count += 1;
        }
        in_word = is_word_char;
    }

    count
}

/// Estimated spoken duration of `text` in minutes.
pub fn estimate_minutes(text: &str) -> f64 {
    count_words(text) as f64 / ESTIMATION_WORDS_PER_MINUTE
}
