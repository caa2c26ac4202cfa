use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::TempDir;
use tracing::debug;

use super::AudioResult;

/// Scratch directory for one pipeline run.
///
/// The directory name carries a random per-run prefix, so concurrent runs
/// never share paths. It is removed when the workspace is dropped, which
/// covers success, error and cancellation alike.
#[derive(Debug)]
pub struct RunWorkspace {
    dir: TempDir,
}

impl RunWorkspace {
    /// Create a workspace under `root`, or the system temp dir.
    pub async fn create(root: Option<&Path>) -> AudioResult<Self> {
        let prefix = format!("podcast-{}-", uuid::Uuid::new_v4().simple());
        if let Some(root) = root {
            tokio::fs::create_dir_all(root).await?;
        }
        let root = root.map(Path::to_path_buf);

        let dir = tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix(&prefix);
            match root {
                Some(root) => builder.tempdir_in(root),
                None => builder.tempdir(),
            }
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!(path = %dir.path().display(), "Created run workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of an artifact inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub async fn write(&self, name: &str, data: &[u8]) -> AudioResult<PathBuf> {
        let path = self.file(name);
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    pub async fn read(&self, path: &Path) -> AudioResult<Bytes> {
        Ok(Bytes::from(tokio::fs::read(path).await?))
    }
}
