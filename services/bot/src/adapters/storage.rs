//! services/bot/src/adapters/storage.rs
//!
//! Filesystem implementation of the `MediaStorage` port. Voice notes are kept
//! on disk next to the service so the original audio can be reviewed later.

use async_trait::async_trait;
use site_report_core::ports::{MediaStorage, PortError, PortResult};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct FsAudioStorage {
    dir: PathBuf,
}

impl FsAudioStorage {
    /// Opens the storage directory, creating it if needed.
    pub async fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }
}

#[async_trait]
impl MediaStorage for FsAudioStorage {
    async fn store(&self, file_name: &str, data: &[u8]) -> PortResult<String> {
        let is_plain_name = Path::new(file_name)
            .file_name()
            .is_some_and(|name| name == file_name);
        if !is_plain_name {
            return Err(PortError::Unexpected(format!(
                "Refusing to store audio under '{file_name}'"
            )));
        }

        let path = self.dir.join(file_name);
        // An existing audio file is never overwritten.
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| PortError::Unexpected(format!("{}: {}", path.display(), e)))?;
        file.write_all(data)
            .await
            .map_err(|e| PortError::Unexpected(format!("{}: {}", path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| PortError::Unexpected(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), bytes = data.len(), "audio written");
        Ok(path.display().to_string())
    }
}
