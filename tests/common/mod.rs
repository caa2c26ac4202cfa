//! Shared fixtures for integration tests.
//!
//! Providers are mocked with wiremock; ffmpeg is replaced by the library's
//! [`FakeTranscoder`], which writes real WAV files so duration probing still
//! works.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use podcast_gateway::core::RateLimitPolicy;
pub use podcast_gateway::core::audio::testing::FakeTranscoder;
use podcast_gateway::core::script::{OpenAIGenerator, OpenAIGeneratorConfig};
use podcast_gateway::core::tts::{UnrealSpeechConfig, UnrealSpeechTTS};
use podcast_gateway::core::{PipelineOrchestrator, PipelineSettings};

pub const SPEECH_KEY: &str = "test-unreal-key";
pub const LLM_KEY: &str = "test-llm-key";

/// Retry policy with millisecond waits.
pub fn fast_policy() -> RateLimitPolicy {
    RateLimitPolicy {
        max_attempts: 4,
        fallback_step: Duration::from_millis(1),
        min_wait: Duration::from_millis(1),
        max_wait: Duration::from_millis(10),
    }
}

/// A script of exactly `words` words, split into short sentences.
pub fn script_of(words: usize) -> String {
    let mut out = String::new();
    for i in 0..words {
        out.push_str("word");
        if i % 10 == 9 {
            out.push_str(". ");
        } else {
            out.push(' ');
        }
    }
    out.trim_end().to_string()
}

pub fn chat_completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    }))
}

/// Mount a mood classifier answering `mood` and a script writer answering `script`.
pub async fn mount_llm(server: &MockServer, script: &str, mood: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Valid moods"))
        .respond_with(chat_completion(mood))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_completion(script))
        .mount(server)
        .await;
}

/// Mount a speech submit endpoint that hands out `/audio/voice.mp3`, and the
/// download behind it returning `audio`.
pub async fn mount_speech(server: &MockServer, audio: &[u8]) {
    Mock::given(method("POST"))
        .and(path("/speech"))
        .and(header("authorization", format!("Bearer {SPEECH_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "OutputUri": format!("{}/audio/voice.mp3", server.uri()),
            "TaskId": "task-1",
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/audio/voice.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio.to_vec()))
        .mount(server)
        .await;
}

pub fn generator(server: &MockServer) -> OpenAIGenerator {
    OpenAIGenerator::new(OpenAIGeneratorConfig {
        api_key: LLM_KEY.to_string(),
        base_url: format!("{}/v1", server.uri()),
        ..Default::default()
    })
    .unwrap()
    .with_rate_limit_policy(fast_policy())
}

pub fn synthesizer(server: &MockServer) -> UnrealSpeechTTS {
    UnrealSpeechTTS::new(UnrealSpeechConfig {
        endpoint: format!("{}/speech", server.uri()),
        ..UnrealSpeechConfig::new(SPEECH_KEY)
    })
    .unwrap()
    .with_rate_limit_policy(fast_policy())
}

pub fn orchestrator(
    server: &MockServer,
    transcoder: Arc<FakeTranscoder>,
    settings: PipelineSettings,
) -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        Arc::new(generator(server)),
        Arc::new(synthesizer(server)),
        transcoder,
        settings,
    )
}

pub fn settings(temp_root: &Path) -> PipelineSettings {
    PipelineSettings {
        temp_dir: Some(temp_root.to_path_buf()),
        music_dir: None,
        allow_private_music_urls: true,
    }
}

/// Number of entries left under a temp root.
pub fn leftover_entries(root: &Path) -> usize {
    std::fs::read_dir(root).map(|dir| dir.count()).unwrap_or(0)
}
