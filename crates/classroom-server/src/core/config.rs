//! Server configuration

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use classroom_blob::ImageCache;
use tracing::{info, warn};

use crate::chat::ChatStore;

/// Configuration for the classroom server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Root directory for all local data
    pub data_dir: PathBuf,
    /// Staging area for multipart uploads
    pub uploads_dir: PathBuf,
    /// Local mirror of remote images
    pub image_cache_dir: PathBuf,
    /// Port to listen on
    pub port: u16,
    /// Keep images in S3; otherwise they live in memory
    pub use_s3: bool,
    /// Custom S3-compatible endpoint; `None` means AWS itself
    pub object_store_url: Option<String>,
    pub object_store_bucket: String,
    /// Max multipart body size in MB
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_base_dir("classroom_data")
    }
}

impl ServerConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let data_dir = env::var("CLASSROOM_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("classroom_data"));

        let mut config = Self::with_base_dir(data_dir);
        config.port = try_load("PORT", config.port);
        config.object_store_url = env::var("OBJECT_STORE_URL").ok().filter(|s| !s.is_empty());
        config.object_store_bucket =
            env::var("OBJECT_STORE_BUCKET").unwrap_or(config.object_store_bucket);
        config.use_s3 = config.object_store_url.is_some()
            || env::var("OBJECT_STORE").is_ok_and(|kind| kind.eq_ignore_ascii_case("s3"));
        config.max_upload_mb = try_load("MAX_UPLOAD_MB", config.max_upload_mb);
        config
    }

    /// Create config with custom base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base = base_dir.into();
        Self {
            uploads_dir: base.join("uploads"),
            image_cache_dir: base.join("image_cache"),
            data_dir: base,
            port: 3000,
            use_s3: false,
            object_store_url: None,
            object_store_bucket: "classroom-images".to_string(),
            max_upload_mb: 10,
        }
    }

    /// Ensure all directories exist
    pub async fn ensure_dirs(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::create_dir_all(&self.image_cache_dir).await?;
        Ok(())
    }
}

fn try_load<T: FromStr>(key: &str, default: T) -> T
where
    T: Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {} value {:?}: {}, using default: {}", key, raw, e, default);
            default
        }),
        Err(_) => {
            info!("{} not set, using default: {}", key, default);
            default
        }
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub chat: Arc<ChatStore>,
    pub images: Arc<ImageCache>,
}
