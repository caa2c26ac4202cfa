//! Script cleanup before synthesis.
//!
//! Generated scripts occasionally carry markdown, list markers, music cues
//! and bracketed stage directions even when asked not to. None of that should
//! be spoken, so it is removed and whitespace is collapsed to single spaces.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static HEADERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*#{1,6}\s+").expect("valid regex"));
static PAUSE_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[PAUSE\]").expect("valid regex"));
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.*?)`").expect("valid regex"));
static BULLETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[*\-]\s+").expect("valid regex"));
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").expect("valid regex"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.,!?;:()'\-]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip markup and stage directions and normalize whitespace.
pub fn clean_for_speech(text: &str) -> String {
    let cleaned = HEADERS.replace_all(text, "");
    let cleaned = PAUSE_MARKERS.replace_all(&cleaned, ".");
    let cleaned = BRACKETED.replace_all(&cleaned, "");
    let cleaned = BOLD.replace_all(&cleaned, "$1");
    let cleaned = ITALIC.replace_all(&cleaned, "$1");
    let cleaned = INLINE_CODE.replace_all(&cleaned, "$1");
    let cleaned = BULLETS.replace_all(&cleaned, "");
    let cleaned = NUMBERED.replace_all(&cleaned, "");
    let cleaned = DISALLOWED.replace_all(&cleaned, "");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim().to_string();

    debug!(
        original_len = text.len(),
        cleaned_len = cleaned.len(),
        "Cleaned script for synthesis"
    );

    cleaned
}
