//! Archive contents read from disk.

use super::fetch::extract_zip;
use super::{ArchiveContents, ArchiveSource, Fetching};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// A provider archive already on disk: either the zip file itself or a
/// directory it was extracted into.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    path: PathBuf,
}

impl LocalArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every regular file of the directory, or decode the zip file.
    ///
    /// Subdirectories are not descended into.
    pub async fn read_all(&self) -> Result<ArchiveContents, NetError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .path_context(&self.path)?;

        if metadata.is_file() {
            let bytes = tokio::fs::read(&self.path).await.path_context(&self.path)?;
            return extract_zip(&bytes);
        }

        let mut entries = tokio::fs::read_dir(&self.path)
            .await
            .path_context(&self.path)?;
        let mut contents = ArchiveContents::new();

        while let Some(entry) = entries.next_entry().await.path_context(&self.path)? {
            let path = entry.path();
            if !entry.file_type().await.path_context(&path)?.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let data = tokio::fs::read(&path).await.path_context(&path)?;
            contents.insert(name.to_string(), data);
        }

        tracing::debug!(path = %self.path.display(), files = contents.len(), "read local archive");
        Ok(contents)
    }
}

impl ArchiveSource for LocalArchive {
    fn fetch<'a>(&'a self, cancel: &'a CancellationToken) -> Fetching<'a> {
        Box::pin(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(NetError::Cancelled),
                contents = self.read_all() => contents,
            }
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
