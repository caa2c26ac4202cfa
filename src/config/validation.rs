//! Configuration validation logic.

use tracing::warn;

use super::ServerConfig;
use crate::core::tts::unreal_speech::is_valid_bitrate;

fn validate_http_url(name: &str, value: &str) -> Result<(), String> {
    let url = url::Url::parse(value).map_err(|e| format!("Invalid {name} '{value}': {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("{name} must use http or https, got '{other}'")),
    }
}

fn validate_bitrate(value: &str) -> Result<(), String> {
    if is_valid_bitrate(value) {
        Ok(())
    } else {
        Err(format!("Invalid TTS bitrate '{value}', expected e.g. '320k'"))
    }
}

/// Validate a fully merged configuration.
///
/// Missing provider credentials are not an error here: the server can start
/// and answer health checks, and building the pipeline reports them.
pub(super) fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_http_url("UNREAL_SPEECH_URL", &config.unreal_speech_url)?;
    validate_http_url("OPENAI_BASE_URL", &config.openai_base_url)?;
    validate_bitrate(&config.tts_bitrate)?;

    if config.voice_id.trim().is_empty() {
        return Err("TTS_VOICE_ID must not be empty".into());
    }
    if config.llm_model.trim().is_empty() {
        return Err("LLM_MODEL must not be empty".into());
    }
    if config.ffmpeg_path.trim().is_empty() {
        return Err("FFMPEG_PATH must not be empty".into());
    }

    if let Some(dir) = &config.music_dir {
        if !dir.is_dir() {
            warn!(music_dir = %dir.display(), "MUSIC_DIR does not exist; mood music will be unavailable");
        }
    }
    if config.allow_private_music_urls {
        warn!("ALLOW_PRIVATE_MUSIC_URLS is enabled; remote music may target internal hosts");
    }

    Ok(())
}
