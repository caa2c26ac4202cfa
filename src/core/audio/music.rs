use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};
use url::Url;

use super::{AudioError, AudioResult};
use crate::core::script::MoodLabel;
use crate::utils::url_validation::validate_music_url;

/// Timeout for fetching a remote music bed.
const MUSIC_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a background music bed comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicSource {
    Local(PathBuf),
    Remote(Url),
}

impl MusicSource {
    /// Parse `file://` URLs, `http(s)://` URLs and bare paths.
    pub fn parse(raw: &str) -> AudioResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AudioError::MusicUnavailable("empty music source".to_string()));
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw)
                .map_err(|e| AudioError::MusicUnavailable(format!("invalid URL: {e}")))?;
            return Ok(MusicSource::Remote(url));
        }

        if raw.starts_with("file://") {
            let path = Url::parse(raw)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| AudioError::MusicUnavailable(format!("invalid file URL: {raw}")))?;
            return Ok(MusicSource::Local(path));
        }

        if let Some((scheme, _)) = raw.split_once("://") {
            return Err(AudioError::MusicUnavailable(format!(
                "unsupported scheme: {scheme}"
            )));
        }

        Ok(MusicSource::Local(PathBuf::from(raw)))
    }
}

/// Static mood to music-bed mapping.
///
/// Each label maps to `<label>.mp3` inside the configured music directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoodMusicTable {
    music_dir: Option<PathBuf>,
}

impl MoodMusicTable {
    pub fn new(music_dir: Option<PathBuf>) -> Self {
        Self { music_dir }
    }

    pub fn file_name(mood: MoodLabel) -> String {
        format!("{}.mp3", mood.as_str())
    }

    /// Source for `mood`, or `None` when no music directory is configured.
    pub fn source_for(&self, mood: MoodLabel) -> Option<MusicSource> {
        self.music_dir
            .as_ref()
            .map(|dir| MusicSource::Local(dir.join(Self::file_name(mood))))
    }
}

/// Loads music bytes from local files or remote URLs.
#[derive(Debug, Clone)]
pub struct MusicFetcher {
    client: reqwest::Client,
    allow_private_urls: bool,
}

impl MusicFetcher {
    pub fn new(allow_private_urls: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            allow_private_urls,
        }
    }

    pub async fn fetch(&self, source: &MusicSource) -> AudioResult<Bytes> {
        let bytes = match source {
            MusicSource::Local(path) => self.read_local(path).await?,
            MusicSource::Remote(url) => self.fetch_remote(url).await?,
        };
        if bytes.is_empty() {
            return Err(AudioError::MusicUnavailable("music source is empty".to_string()));
        }
        info!(bytes = bytes.len(), "Music bed loaded");
        Ok(bytes)
    }

    async fn read_local(&self, path: &Path) -> AudioResult<Bytes> {
        debug!(path = %path.display(), "Reading local music bed");
        tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|e| AudioError::MusicUnavailable(format!("{}: {e}", path.display())))
    }

    async fn fetch_remote(&self, url: &Url) -> AudioResult<Bytes> {
        let url = validate_music_url(url.as_str(), self.allow_private_urls)
            .await
            .map_err(|e| AudioError::MusicUnavailable(e.to_string()))?;

        debug!(host = url.host_str().unwrap_or_default(), "Fetching remote music bed");
        let response = self
            .client
            .get(url)
            .timeout(MUSIC_FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| AudioError::MusicUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AudioError::MusicUnavailable(format!(
                "HTTP {status} fetching music"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| AudioError::MusicUnavailable(e.to_string()))
    }
}
