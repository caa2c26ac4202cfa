use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///
/// providers:
///   unreal_speech_api_key: "your-unreal-speech-key"
///   unreal_speech_url: "https://api.v8.unrealspeech.com/speech"
///   openai_api_key: "your-openai-key"
///   openai_base_url: "https://api.groq.com/openai/v1"
///
/// tts:
///   voice_id: "am_michael"
///   bitrate: "320k"
///
/// llm:
///   model: "llama-3.1-8b-instant"
///
/// audio:
///   ffmpeg_path: "/usr/bin/ffmpeg"
///   temp_dir: "/var/tmp/podcast-gateway"
///   music_dir: "/srv/podcast-gateway/music"
///
/// security:
///   cors_allowed_origins: "https://app.example.com"
///   allow_private_music_urls: false
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub providers: Option<ProvidersYaml>,
    pub tts: Option<TtsYaml>,
    pub llm: Option<LlmYaml>,
    pub audio: Option<AudioYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Provider credentials and endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub unreal_speech_api_key: Option<String>,
    pub unreal_speech_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsYaml {
    pub voice_id: Option<String>,
    pub bitrate: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmYaml {
    pub model: Option<String>,
}

/// Audio tooling from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub ffmpeg_path: Option<String>,
    pub temp_dir: Option<String>,
    pub music_dir: Option<String>,
}

/// Security settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
    pub allow_private_music_urls: Option<bool>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
