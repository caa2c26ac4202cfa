//! Merging YAML overrides onto the environment configuration.

use std::path::PathBuf;

use super::ServerConfig;
use super::env;
use super::yaml::YamlConfig;

/// Environment configuration with any YAML values applied on top.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = env::from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
    }

    if let Some(providers) = yaml.providers {
        if providers.unreal_speech_api_key.is_some() {
            config.unreal_speech_api_key = providers.unreal_speech_api_key;
        }
        if let Some(url) = providers.unreal_speech_url {
            config.unreal_speech_url = url;
        }
        if providers.openai_api_key.is_some() {
            config.openai_api_key = providers.openai_api_key;
        }
        if let Some(url) = providers.openai_base_url {
            config.openai_base_url = url;
        }
    }

    if let Some(tts) = yaml.tts {
        if let Some(voice_id) = tts.voice_id {
            config.voice_id = voice_id;
        }
        if let Some(bitrate) = tts.bitrate {
            config.tts_bitrate = bitrate;
        }
    }

    if let Some(model) = yaml.llm.and_then(|llm| llm.model) {
        config.llm_model = model;
    }

    if let Some(audio) = yaml.audio {
        if let Some(path) = audio.ffmpeg_path {
            config.ffmpeg_path = path;
        }
        if let Some(dir) = audio.temp_dir {
            config.temp_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = audio.music_dir {
            config.music_dir = Some(PathBuf::from(dir));
        }
    }

    if let Some(security) = yaml.security {
        if security.cors_allowed_origins.is_some() {
            config.cors_allowed_origins = security.cors_allowed_origins;
        }
        if let Some(allow) = security.allow_private_music_urls {
            config.allow_private_music_urls = allow;
        }
    }

    Ok(config)
}
