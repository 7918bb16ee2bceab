use crate::error::{GenerationError, GenerationResult};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub const VIDEO_PREFIX: &str = "video_";
pub const VIDEO_EXTENSION: &str = "mp4";

/// Flat directory of generated videos, keyed by file name.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh identifier, `video_<uuid>.mp4`.
    pub fn allocate(&self) -> String {
        format!("{}{}.{}", VIDEO_PREFIX, Uuid::new_v4(), VIDEO_EXTENSION)
    }

    /// Retrieval path the HTTP surface serves `identifier` under.
    pub fn retrieval_path(identifier: &str) -> String {
        format!("/video/{}", identifier)
    }

    fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        let valid = !identifier.is_empty()
            && !identifier.starts_with('.')
            && !identifier.contains(['/', '\\'])
            && identifier != "..";
        valid.then(|| self.root.join(identifier))
    }

    /// Writes `bytes` under `identifier`.
    ///
    /// The payload goes to a hidden sibling first and is renamed into place,
    /// so readers never see a partial file.
    pub async fn put(&self, identifier: &str, bytes: &[u8]) -> GenerationResult<PathBuf> {
        let Some(path) = self.resolve(identifier) else {
            return Err(GenerationError::Validation(format!(
                "invalid asset identifier '{}'",
                identifier
            )));
        };
        let tmp_path = self.root.join(format!(".{}.part", identifier));

        let written = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp_path, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(GenerationError::Storage(e));
        }
        Ok(path)
    }

    pub async fn exists(&self, identifier: &str) -> bool {
        match self.resolve(identifier) {
            Some(path) => tokio::fs::metadata(&path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false),
            None => false,
        }
    }

    pub async fn get_path(&self, identifier: &str) -> GenerationResult<PathBuf> {
        if !self.exists(identifier).await {
            return Err(GenerationError::NotFound("Video".to_string()));
        }
        self.resolve(identifier)
            .ok_or_else(|| GenerationError::NotFound("Video".to_string()))
    }
}
