use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Emotional tone of an episode, used to pick background music.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Happy,
    Sad,
    #[default]
    Relaxing,
    Suspense,
    Motivate,
}

impl MoodLabel {
    /// All labels in classifier order. Matching walks this order, so the
    /// first label contained in a response wins.
    pub const ALL: [MoodLabel; 5] = [
        MoodLabel::Happy,
        MoodLabel::Sad,
        MoodLabel::Relaxing,
        MoodLabel::Suspense,
        MoodLabel::Motivate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "happy",
            MoodLabel::Sad => "sad",
            MoodLabel::Relaxing => "relaxing",
            MoodLabel::Suspense => "suspense",
            MoodLabel::Motivate => "motivate",
        }
    }

    /// Sanitize a free-form classifier answer into a label.
    ///
    /// Falls back to [`MoodLabel::Relaxing`] when nothing matches.
    pub fn from_response(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|label| lowered.contains(label.as_str()))
            .unwrap_or_default()
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mood label: {s}"))
    }
}
