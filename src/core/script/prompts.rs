//! Prompt templates for the text generator.

use super::mood::MoodLabel;

/// Speaking rate the script prompt sizes its word target with.
///
/// Distinct from the 150 wpm estimation rate used when the
/// generated script is measured.
pub const SCRIPT_WORDS_PER_MINUTE: u32 = 180;

/// Word count the script prompt asks for.
pub fn target_words(minutes: u32) -> u32 {
    minutes * SCRIPT_WORDS_PER_MINUTE
}

fn depth_guidance(minutes: u32) -> &'static str {
    match minutes {
        0..=2 => "Keep it concise and focused on the most essential points.",
        3..=5 => "Include more detailed explanations, examples, and context.",
        6..=8 => {
            "Provide comprehensive coverage with multiple examples, detailed explanations, and various perspectives."
        }
        _ => {
            "Create an in-depth exploration with extensive examples, detailed analysis, multiple viewpoints, and thorough explanations."
        }
    }
}

/// Prompt asking for a plain-text, speakable script of `minutes` length.
pub fn script_prompt(topic: &str, minutes: u32) -> String {
    let words = target_words(minutes);
    let guidance = depth_guidance(minutes);

    format!(
        r#"You are a professional podcast host creating engaging, educational content. Write a compelling podcast script about: "{topic}" that is approximately {minutes} minutes long when spoken at a normal pace.

TARGET LENGTH: Approximately {words} words ({minutes} minutes of speaking time)

Requirements:
- Write in a conversational, engaging tone as if speaking directly to listeners
- Start with a captivating hook that immediately grabs attention
- Structure the content logically with smooth transitions between ideas
- Use storytelling techniques and real-world examples when relevant
- Include rhetorical questions to maintain audience engagement
- {guidance}
- Use varied sentence lengths for natural rhythm
- Do not include any placeholders, host names, channel names, or template text
- Do NOT use markdown formatting (no **bold**, *italic*, or [brackets])
- Do NOT include music cues, intro/outro markers, or special formatting
- Write plain text that flows naturally when spoken
- LENGTH RULES: Do not write fewer than {words} words. It is acceptable to exceed by up to 10% if needed for a coherent ending.
"#
    )
}

/// Prompt asking for exactly one mood label.
pub fn mood_prompt(topic: &str) -> String {
    let labels = MoodLabel::ALL
        .iter()
        .map(MoodLabel::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are selecting background music mood for a podcast episode based on the user's topic.\n\
         \n\
         Valid moods: {labels}\n\
         \n\
         Task: Given the topic, choose exactly ONE mood from the valid list that best matches the vibe the listener should feel during the episode. Consider sentiment, energy, and subject tone. Avoid over-dramatizing.\n\
         \n\
         Topic: {topic}\n\
         \n\
         Output rules:\n\
         - Respond with only the single mood word from the list\n\
         - No punctuation, no quotes, no additional text"
    )
}
