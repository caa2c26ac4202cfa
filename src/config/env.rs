//! Environment variable loading.

use std::env;
use std::path::PathBuf;

use super::{DEFAULT_FFMPEG_PATH, DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
use crate::core::script::openai::{DEFAULT_LLM_MODEL, OPENAI_BASE_URL};
use crate::core::tts::unreal_speech::{DEFAULT_BITRATE, DEFAULT_VOICE_ID, UNREAL_SPEECH_TTS_URL};

/// Non-empty value of `name`, if set.
fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("Invalid boolean for {name}: '{other}'")),
    }
}

/// Build a [`ServerConfig`] from the process environment and defaults.
pub(super) fn from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let port = match env_opt("PORT") {
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT value '{raw}': {e}"))?,
        None => DEFAULT_PORT,
    };

    let allow_private_music_urls = match env_opt("ALLOW_PRIVATE_MUSIC_URLS") {
        Some(raw) => parse_bool("ALLOW_PRIVATE_MUSIC_URLS", &raw)?,
        None => false,
    };

    Ok(ServerConfig {
        host: env_or("HOST", DEFAULT_HOST),
        port,
        unreal_speech_api_key: env_opt("UNREAL_SPEECH_API_KEY"),
        unreal_speech_url: env_or("UNREAL_SPEECH_URL", UNREAL_SPEECH_TTS_URL),
        voice_id: env_or("TTS_VOICE_ID", DEFAULT_VOICE_ID),
        tts_bitrate: env_or("TTS_BITRATE", DEFAULT_BITRATE),
        openai_api_key: env_opt("OPENAI_API_KEY"),
        openai_base_url: env_or("OPENAI_BASE_URL", OPENAI_BASE_URL),
        llm_model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
        ffmpeg_path: env_or("FFMPEG_PATH", DEFAULT_FFMPEG_PATH),
        temp_dir: env_opt("TEMP_DIR").map(PathBuf::from),
        music_dir: env_opt("MUSIC_DIR").map(PathBuf::from),
        allow_private_music_urls,
        cors_allowed_origins: env_opt("CORS_ALLOWED_ORIGINS"),
    })
}
