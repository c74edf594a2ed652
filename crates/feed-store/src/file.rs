use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use feed_types::models::Post;

use crate::{PostStore, Result};

/// Posts kept as a single JSON array on disk.
///
/// Writes go to a sibling temp file which is synced and then renamed over the
/// live file, so readers only ever see a complete collection.
pub struct JsonFileStore {
    path: PathBuf,
    // Held across the whole read-modify-write of an append.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating it as an empty collection if the
    /// file does not exist yet. An existing file is left untouched, even if it
    /// does not parse.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let store = Self {
            path,
            write_lock: Mutex::new(()),
        };

        if !fs::try_exists(&store.path).await? {
            store.persist(&[]).await?;
            info!("Initialized empty post collection at {}", store.path.display());
        } else {
            info!("Post collection at {}", store.path.display());
        }

        Ok(store)
    }

    async fn load(&self) -> Result<Vec<Post>> {
        let bytes = fs::read(&self.path).await.map_err(|e| {
            error!("Failed to read {}: {}", self.path.display(), e);
            e
        })?;
        let posts = serde_json::from_slice(&bytes).map_err(|e| {
            error!("Corrupt post collection at {}: {}", self.path.display(), e);
            e
        })?;
        Ok(posts)
    }

    async fn persist(&self, posts: &[Post]) -> Result<()> {
        let bytes = serde_json::to_vec(posts)?;
        replace_file(&self.path, &self.tmp_path(), &bytes)
            .await
            .map_err(|e| {
                error!("Failed to persist {}: {}", self.path.display(), e);
                e
            })?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "posts".into());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
    }
}

/// Write `bytes` to `tmp`, sync, then rename over `path`. On any failure `path`
/// is untouched and `tmp` is removed.
async fn replace_file(path: &Path, tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let written = async {
        let mut file = fs::File::create(tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        fs::rename(tmp, path).await?;
        Ok::<_, std::io::Error>(())
    }
    .await;

    if written.is_err() {
        let _ = fs::remove_file(tmp).await;
    }
    written
}

#[async_trait]
impl PostStore for JsonFileStore {
    async fn read_all(&self) -> Result<Vec<Post>> {
        self.load().await
    }

    async fn append(&self, post: Post) -> Result<Vec<Post>> {
        let _guard = self.write_lock.lock().await;

        let mut posts = self.load().await?;
        posts.push(post);
        self.persist(&posts).await?;
        Ok(posts)
    }
}
