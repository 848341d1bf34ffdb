//! Read-through image cache.
//!
//! Images live in the remote [`ObjectStore`]; the cache mirrors each key as
//! `cache_dir/<key>` the first time it is requested, with the content type
//! the remote reported kept in `cache_dir/.meta/<key>`. A file that exists is
//! served as-is: entries are never checked or invalidated, since keys are
//! generated fresh for every upload and never reused for other content.

use crate::error::{BlobError, Result};
use crate::remote::ObjectStore;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

const TEMP_DIR: &str = ".tmp";
const META_DIR: &str = ".meta";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub struct ImageCache {
    cache_dir: PathBuf,
    remote: Arc<dyn ObjectStore>,
}

impl ImageCache {
    /// Create the cache, creating `cache_dir` if it does not exist yet.
    pub async fn new(cache_dir: impl Into<PathBuf>, remote: Arc<dyn ObjectStore>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).await?;
        Ok(Self { cache_dir, remote })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn remote(&self) -> &Arc<dyn ObjectStore> {
        &self.remote
    }

    /// Where `key` is (or would be) mirrored on disk.
    pub fn local_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.cache_dir.join(key))
    }

    fn meta_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.cache_dir.join(META_DIR).join(key))
    }

    /// Return a local path holding the bytes of `key`, fetching from the
    /// remote store only on a miss.
    ///
    /// A failed fetch leaves no file behind. Two concurrent misses for the
    /// same key may both fetch; they write identical bytes to the same path.
    pub async fn resolve(&self, key: &str) -> Result<PathBuf> {
        let path = self.local_path(key)?;

        if fs::try_exists(&path).await? {
            debug!("Image cache hit: {}", key);
            return Ok(path);
        }

        info!("Image cache miss: {}, fetching from remote", key);
        let object = self.remote.get_object(key).await.map_err(|e| {
            warn!(kind = e.kind(), "Failed to fetch image {}: {}", key, e);
            e
        })?;

        let temp_dir = self.cache_dir.join(TEMP_DIR);
        // Type first, so any visible image file already has its type beside it.
        if let Some(content_type) = &object.content_type {
            atomic_write(&self.meta_path(key)?, content_type.as_bytes(), &temp_dir).await?;
        }
        atomic_write(&path, &object.data, &temp_dir).await?;
        info!("Cached image {} ({} bytes)", key, object.data.len());

        Ok(path)
    }

    /// Content type to serve `key` with: what the remote reported when the
    /// key was cached, else a guess from the key's extension.
    pub async fn content_type(&self, key: &str) -> Result<String> {
        let meta = self.meta_path(key)?;
        match fs::read_to_string(&meta).await {
            Ok(recorded) if !recorded.trim().is_empty() => Ok(recorded.trim().to_string()),
            _ => Ok(content_type_for_key(key).to_string()),
        }
    }

    /// Upload a staged file under a freshly generated key and return the key.
    ///
    /// The staged file is deleted after the attempt, whether it succeeded
    /// or not.
    pub async fn store(&self, tag: &str, staged: &Path, content_type: &str) -> Result<String> {
        let result = self.upload_staged(tag, staged, content_type).await;

        if let Err(e) = fs::remove_file(staged).await {
            warn!("Failed to delete staged upload {:?}: {}", staged, e);
        }

        result
    }

    async fn upload_staged(&self, tag: &str, staged: &Path, content_type: &str) -> Result<String> {
        let key = generate_key(tag, content_type);
        validate_key(&key)?;

        let data = fs::read(staged).await?;
        let size = data.len();
        self.remote
            .put_object(&key, Bytes::from(data), content_type)
            .await?;

        info!("Stored image {} ({} bytes, {})", key, size, content_type);
        Ok(key)
    }
}

/// Reject keys that could escape the cache directory.
pub fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\', '\0']);
    if bad {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// `<tag>-<uuid>.<ext>`, e.g. `question-12-4f1c...e2.png`. Types with no
/// known extension get no suffix.
pub fn generate_key(tag: &str, content_type: &str) -> String {
    match extension_for(content_type) {
        Some(ext) => format!("{}-{}.{}", tag, Uuid::new_v4(), ext),
        None => format!("{}-{}", tag, Uuid::new_v4()),
    }
}

/// An extension that maps back to `content_type`, preferring the subtype
/// itself (`image/jpeg` -> `jpeg`).
fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    let subtype = essence.split('/').nth(1).unwrap_or("");

    let candidates: Vec<&'static str> = mime_guess::get_mime_extensions_str(&essence)?
        .iter()
        .copied()
        .filter(|ext| mime_guess::from_ext(ext).first_raw() == Some(essence.as_str()))
        .collect();

    candidates
        .iter()
        .copied()
        .find(|ext| *ext == subtype)
        .or_else(|| candidates.first().copied())
}

/// Content type guessed from a key's extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    mime_guess::from_path(key)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

pub async fn atomic_write(dest: &Path, data: &[u8], temp_folder: &Path) -> Result<()> {
    fs::create_dir_all(temp_folder).await?;

    let temp_path = temp_folder.join(format!("tmp_{}", Uuid::new_v4()));
    if let Err(e) = fs::write(&temp_path, data).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    if let Err(e) = fs::rename(&temp_path, dest).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    Ok(())
}
