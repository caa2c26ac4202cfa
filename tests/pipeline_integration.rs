//! End-to-end pipeline tests against mocked providers.
//!
//! The text generator and the speech provider are served by wiremock; ffmpeg
//! is replaced by the fake transcoder from `common`.

mod common;

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    FakeTranscoder, chat_completion, leftover_entries, mount_llm, mount_speech, orchestrator,
    script_of, settings,
};
use podcast_gateway::core::{GenerateRequest, MixOptions, PipelineError};

const TOPIC: &str = "The history of electric vehicles";

fn chat_requests(requests: &[wiremock::Request]) -> usize {
    requests
        .iter()
        .filter(|r| r.url.path() == "/v1/chat/completions")
        .count()
}

#[tokio::test]
async fn test_short_script_returns_provider_audio() {
    let server = MockServer::start().await;
    mount_llm(&server, &script_of(300), "relaxing").await;
    mount_speech(&server, b"ID3-provider-mp3").await;

    let root = TempDir::new().unwrap();
    let transcoder = Arc::new(FakeTranscoder::default());
    let pipeline = orchestrator(&server, transcoder.clone(), settings(root.path()));

    let audio = pipeline
        .generate(&GenerateRequest::new(TOPIC, 2))
        .await
        .unwrap();

    assert_eq!(audio.data.as_ref(), b"ID3-provider-mp3");
    assert_eq!(audio.mime_type, "audio/mpeg");
    // single chunk: provider bytes pass through untouched
    assert!(transcoder.jobs().is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(chat_requests(&requests), 2);
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn test_short_first_attempt_is_regenerated_with_larger_target() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Valid moods"))
        .respond_with(chat_completion("Motivate"))
        .mount(&server)
        .await;
    // 150 words is one minute, half the request
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Approximately 360 words"))
        .respond_with(chat_completion(&script_of(150)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Approximately 720 words"))
        .respond_with(chat_completion(&script_of(300)))
        .expect(1)
        .mount(&server)
        .await;
    mount_speech(&server, b"voice").await;

    let root = TempDir::new().unwrap();
    let pipeline = orchestrator(
        &server,
        Arc::new(FakeTranscoder::default()),
        settings(root.path()),
    );

    let audio = pipeline
        .generate(&GenerateRequest::new(TOPIC, 2))
        .await
        .unwrap();
    assert_eq!(audio.data.as_ref(), b"voice");

    let requests = server.received_requests().await.unwrap();
    // two script attempts, each followed by a mood request
    assert_eq!(chat_requests(&requests), 4);
}

#[tokio::test]
async fn test_long_script_is_chunked_and_concatenated() {
    let server = MockServer::start().await;
    // 600 words at 150 wpm is exactly four minutes and over one chunk
    mount_llm(&server, &script_of(600), "suspense").await;
    mount_speech(&server, b"1.5").await;

    let root = TempDir::new().unwrap();
    let transcoder = Arc::new(FakeTranscoder::default());
    let pipeline = orchestrator(&server, transcoder.clone(), settings(root.path()));

    let audio = pipeline
        .generate(&GenerateRequest::new(TOPIC, 4))
        .await
        .unwrap();

    assert_eq!(String::from_utf8_lossy(&audio.data), "mp3:3.000");

    let requests = server.received_requests().await.unwrap();
    let submits: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path() == "/speech")
        .collect();
    assert_eq!(submits.len(), 2);
    for submit in submits {
        let body: serde_json::Value = serde_json::from_slice(&submit.body).unwrap();
        assert!(body["Text"].as_str().unwrap().chars().count() <= 3000);
    }

    let graphs = transcoder.rendered_graphs();
    assert!(
        graphs
            .iter()
            .any(|g| g.contains("[0:a][1:a]concat=n=2:v=0:a=1[out]"))
    );
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn test_overlong_topic_rejected_before_any_provider_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(chat_completion("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let pipeline = orchestrator(
        &server,
        Arc::new(FakeTranscoder::default()),
        settings(root.path()),
    );

    let topic = "a".repeat(501);
    let err = pipeline
        .generate(&GenerateRequest::new(topic, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert!(err.is_client_error());

    let err = pipeline
        .generate(&GenerateRequest::new(TOPIC, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[tokio::test]
async fn test_rate_limited_generation_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Approximately 360 words"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "message": "Rate limit reached for model. Please try again in 0.05s.",
                "type": "tokens"
            }
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_llm(&server, &script_of(300), "happy").await;
    mount_speech(&server, b"voice").await;

    let root = TempDir::new().unwrap();
    let pipeline = orchestrator(
        &server,
        Arc::new(FakeTranscoder::default()),
        settings(root.path()),
    );

    let audio = pipeline
        .generate(&GenerateRequest::new(TOPIC, 2))
        .await
        .unwrap();
    assert_eq!(audio.data.as_ref(), b"voice");
}

#[tokio::test]
async fn test_persistent_synthesis_throttling_fails_the_run() {
    let server = MockServer::start().await;
    mount_llm(&server, &script_of(300), "sad").await;
    Mock::given(method("POST"))
        .and(path("/speech"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let pipeline = orchestrator(
        &server,
        Arc::new(FakeTranscoder::default()),
        settings(root.path()),
    );

    let err = pipeline
        .generate(&GenerateRequest::new(TOPIC, 2))
        .await
        .unwrap_err();

    match err {
        PipelineError::IncompleteSynthesis {
            chunk_index,
            attempts,
            reason,
        } => {
            assert_eq!(chunk_index, 0);
            assert_eq!(attempts, 3);
            assert!(reason.contains("rate limited"));
        }
        other => panic!("expected IncompleteSynthesis, got {other:?}"),
    }
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn test_background_music_from_url_is_mixed() {
    let server = MockServer::start().await;
    mount_llm(&server, &script_of(300), "relaxing").await;
    mount_speech(&server, b"120").await;
    Mock::given(method("GET"))
        .and(path("/music/bed.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("45"))
        .expect(1)
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let transcoder = Arc::new(FakeTranscoder::default());
    let pipeline = orchestrator(&server, transcoder.clone(), settings(root.path()));

    let request = GenerateRequest::new(TOPIC, 2).with_mix(MixOptions {
        enable_background_music: true,
        music_source: Some(format!("{}/music/bed.mp3", server.uri())),
        level_db: -20.0,
        enable_ducking: true,
    });
    let audio = pipeline.generate(&request).await.unwrap();

    assert_eq!(String::from_utf8_lossy(&audio.data), "mp3:120.000");

    let graphs = transcoder.rendered_graphs().join("\n");
    assert!(graphs.contains("sidechaincompress"));
    assert!(graphs.contains("volume=-20dB"));
    assert!(graphs.contains("amix=inputs=2"));
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn test_unreachable_music_falls_back_to_voice() {
    let server = MockServer::start().await;
    mount_llm(&server, &script_of(300), "relaxing").await;
    mount_speech(&server, b"voice-only").await;
    Mock::given(method("GET"))
        .and(path("/music/missing.mp3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let pipeline = orchestrator(
        &server,
        Arc::new(FakeTranscoder::default()),
        settings(root.path()),
    );

    let request = GenerateRequest::new(TOPIC, 2).with_mix(MixOptions {
        enable_background_music: true,
        music_source: Some(format!("{}/music/missing.mp3", server.uri())),
        ..Default::default()
    });
    let audio = pipeline.generate(&request).await.unwrap();

    assert_eq!(audio.data.as_ref(), b"voice-only");
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn test_mood_music_from_music_dir() {
    let server = MockServer::start().await;
    mount_llm(&server, &script_of(300), "The mood is Suspense.").await;
    mount_speech(&server, b"90").await;

    let root = TempDir::new().unwrap();
    let music_dir = TempDir::new().unwrap();
    std::fs::write(music_dir.path().join("suspense.mp3"), "30").unwrap();

    let transcoder = Arc::new(FakeTranscoder::default());
    let mut pipeline_settings = settings(root.path());
    pipeline_settings.music_dir = Some(music_dir.path().to_path_buf());
    let pipeline = orchestrator(&server, transcoder.clone(), pipeline_settings);

    let request = GenerateRequest::new(TOPIC, 2).with_mix(MixOptions {
        enable_background_music: true,
        ..Default::default()
    });
    let audio = pipeline.generate(&request).await.unwrap();

    assert_eq!(String::from_utf8_lossy(&audio.data), "mp3:90.000");
    // 90s of voice over a 30s bed needs ceil(90/30)+1 loops
    assert!(
        transcoder
            .rendered_graphs()
            .iter()
            .any(|g| g.contains("concat=n=4:v=0:a=1"))
    );
}
