//! Boundary-aware text chunking for synthesis requests.
//!
//! Text is cut at most every `ceiling` characters. A cut prefers the end of a
//! sentence found within the last [`SENTENCE_SEARCH_WINDOW`] characters, then
//! the last word boundary, and only hard-splits a single token that is longer
//! than the ceiling. All positions are counted in `char`s so multi-byte text
//! never splits inside a code point.

use serde::Serialize;

/// How far back from a tentative cut to look for a sentence terminator.
pub const SENTENCE_SEARCH_WINDOW: usize = 200;

/// A bounded slice of narrative text submitted as one synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// Trimmed, non-empty chunk text
    pub text: String,
    /// Zero-based position in the script, contiguous across chunks
    pub sequence_index: usize,
}

impl TextChunk {
    pub fn new(sequence_index: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sequence_index,
        }
    }

    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[inline]
fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split `text` into ordered chunks of at most `ceiling` characters.
///
/// Chunks are trimmed; pieces that are empty after trimming are dropped
/// without consuming a sequence index.
pub fn split_into_chunks(text: &str, ceiling: usize) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();
    let ceiling = ceiling.max(1);

    let mut chunks = Vec::new();
    let mut cursor = 0;

    while cursor < chars.len() {
        let tentative = cursor + ceiling;
        let end = if tentative < chars.len() {
            find_cut(&chars, cursor, tentative)
        } else {
            chars.len()
        };

        let piece: String = chars[cursor..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(TextChunk::new(chunks.len(), trimmed));
        }

        cursor = end;
    }

    chunks
}

/// Pick the cut position for a chunk starting at `cursor` whose tentative end
/// is `tentative` (exclusive, strictly inside the text).
fn find_cut(chars: &[char], cursor: usize, tentative: usize) -> usize {
    let window_start = tentative.saturating_sub(SENTENCE_SEARCH_WINDOW).max(cursor);

    if let Some(pos) = chars[window_start..tentative]
        .iter()
        .rposition(|c| is_sentence_terminator(*c))
    {
        return window_start + pos + 1;
    }

    // A space exactly at the tentative cut still yields a full-length chunk
    if let Some(pos) = chars[cursor + 1..=tentative]
        .iter()
        .rposition(|c| c.is_whitespace())
    {
        return cursor + 1 + pos;
    }

    tentative
}
