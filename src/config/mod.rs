//! Configuration module for the podcast gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use podcast_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port, CORS)
/// - Provider credentials and endpoints (Unreal Speech, OpenAI-compatible LLM)
/// - Narration settings (voice, bitrate, model)
/// - Audio tooling (ffmpeg binary, scratch and music directories)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Speech synthesis
    pub unreal_speech_api_key: Option<String>,
    pub unreal_speech_url: String,
    pub voice_id: String,
    /// Bitrate requested from the synthesis provider
    pub tts_bitrate: String,

    // Text generation
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub llm_model: String,

    // Audio tooling
    pub ffmpeg_path: String,
    /// Parent for per-run workspaces; system temp dir when unset
    pub temp_dir: Option<PathBuf>,
    /// Directory holding `<mood>.mp3` music beds
    pub music_dir: Option<PathBuf>,

    // Security configuration
    /// Allow remote music URLs that resolve to private addresses
    pub allow_private_music_urls: bool,
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,
}

/// Implement Drop to zeroize all secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.unreal_speech_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (and defaults).
    ///
    /// The `.env` file, if any, is loaded in `main.rs` before this is called.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = env::from_env()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed CORS origins; `None` when CORS is disabled.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let raw = self.cors_allowed_origins.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(
            raw.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        )
    }

    pub fn has_synthesis_credentials(&self) -> bool {
        self.unreal_speech_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn has_generation_credentials(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}
