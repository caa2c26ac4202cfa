//! Text preparation for speech synthesis.
//!
//! - `cleaner`: strips markup and stage directions from generated scripts
//! - `words`: word counting and spoken-duration estimation
//! - `advisor`: chunk size ceiling selection for a target duration
//! - `chunker`: boundary-aware splitting into ordered synthesis chunks

pub mod advisor;
pub mod chunker;
pub mod cleaner;
pub mod words;

pub use advisor::{BASE_CHUNK_SIZE, CHARS_PER_MINUTE, chunk_ceiling};
pub use chunker::{SENTENCE_SEARCH_WINDOW, TextChunk, split_into_chunks};
pub use cleaner::clean_for_speech;
pub use words::{ESTIMATION_WORDS_PER_MINUTE, count_words, estimate_minutes};
