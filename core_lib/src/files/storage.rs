//! Content-addressed byte storage under a single root directory.
//!
//! References are freshly minted random ids, independent of user-supplied
//! names, so stored paths can never collide or traverse outside the root.

use std::path::{Path, PathBuf};

use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

#[derive(Clone)]
pub struct ContentStorage {
    root: PathBuf,
}

impl ContentStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the storage root if missing. Safe to call repeatedly.
    pub async fn initialize(&self) -> Result<()> {
        async_fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Persists `data` under a fresh reference and returns it.
    pub async fn store(&self, data: &[u8]) -> Result<String> {
        self.initialize().await?;

        let content_ref = Uuid::new_v4().to_string();
        let path = self.path_for(&content_ref);

        let mut file = async_fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(content_ref)
    }

    /// Persists bytes at an exact reference, replacing any previous content.
    /// This is what makes derivative regeneration idempotent.
    pub async fn store_at(&self, content_ref: &str, data: &[u8]) -> Result<()> {
        self.initialize().await?;

        let path = self.path_for(content_ref);
        let mut file = async_fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(())
    }

    /// Reads stored bytes; `None` when the reference has no content.
    pub async fn read(&self, content_ref: &str) -> Result<Option<Vec<u8>>> {
        match async_fs::read(self.path_for(content_ref)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reference of the resized copy derived from `content_ref` at `width`.
    pub fn derived_ref(content_ref: &str, width: u32) -> String {
        format!("{}_{}", content_ref, width)
    }

    fn path_for(&self, content_ref: &str) -> PathBuf {
        self.root.join(content_ref)
    }
}
