//! Classroom Server Library
//!
//! Per-class chat relay and read-through image cache for the course Q&A
//! app. Page rendering, sessions, and the relational store live elsewhere.

pub mod chat;
pub mod core;
pub mod images;

use axum::{extract::DefaultBodyLimit, Router};
use classroom_blob::{ImageCache, MemoryObjectStore, ObjectStore, S3ObjectStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chat::ChatStore;
use crate::core::{AppState, ServerConfig};

/// Build the shared state: directories, chat store, and image cache.
pub async fn build_state(
    config: ServerConfig,
    remote: Arc<dyn ObjectStore>,
) -> anyhow::Result<AppState> {
    config.ensure_dirs().await?;

    let images = ImageCache::new(config.image_cache_dir.clone(), remote).await?;

    Ok(AppState {
        config,
        chat: Arc::new(ChatStore::new()),
        images: Arc::new(images),
    })
}

/// The full application router with middleware applied.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_mb.saturating_mul(1024 * 1024);

    crate::core::router()
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn remote_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    if !config.use_s3 {
        warn!("OBJECT_STORE_URL and OBJECT_STORE=s3 not set, keeping images in memory");
        return Ok(Arc::new(MemoryObjectStore::new(
            config.object_store_bucket.clone(),
        )));
    }

    info!(
        "Object store: S3 bucket {} (endpoint {})",
        config.object_store_bucket,
        config.object_store_url.as_deref().unwrap_or("AWS default")
    );
    let store = S3ObjectStore::from_env(
        &config.object_store_bucket,
        config.object_store_url.as_deref(),
    )?;
    Ok(Arc::new(store))
}

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    info!("=== Classroom Server ===");

    let config = ServerConfig::from_env();
    info!("Data directory: {:?}", config.data_dir);

    let remote = remote_store(&config)?;
    match remote.list_buckets().await {
        Ok(buckets) => info!("Object store buckets: {:?}", buckets),
        Err(e) => warn!(kind = e.kind(), "Failed to list buckets: {}", e),
    }

    let port = config.port;
    let state = build_state(config, remote).await?;
    info!("Chat store and image cache initialized");

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
