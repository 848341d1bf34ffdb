use crate::core::{AppState, Error, Result};
use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use classroom_blob::{cache::DEFAULT_CONTENT_TYPE, BlobError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub keys: Vec<String>,
}

/// A multipart file written to the uploads directory, not yet stored.
struct StagedUpload {
    path: PathBuf,
    content_type: String,
}

/// GET /image/{key}
pub async fn get_image(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<(HeaderMap, Bytes)> {
    info!("GET /image/{}", key);

    let path = state.images.resolve(&key).await?;
    let data = fs::read(&path)
        .await
        .map_err(|e| Error::ImageFetch(BlobError::Io(e)))?;

    let content_type = state.images.content_type(&key).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );

    Ok((headers, Bytes::from(data)))
}

/// POST /images/{entity}/{entity_id}
///
/// Stores every file field under a key tagged `<entity>-<entity_id>`.
/// Stops at the first failed store: files not yet stored are discarded,
/// objects already stored stay in the bucket.
pub async fn upload_images(
    Path((entity, entity_id)): Path<(String, String)>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let tag = format!("{}-{}", entity, entity_id);
    info!("POST /images/{}/{} - uploading images", entity, entity_id);

    let mut staged = Vec::new();
    if let Err(e) = stage_fields(&state, &mut multipart, &mut staged).await {
        discard_staged(&staged).await;
        return Err(e);
    }

    if staged.is_empty() {
        return Err(Error::BadRequest("No image files in upload".to_string()));
    }

    let mut keys = Vec::with_capacity(staged.len());
    let mut pending = staged.into_iter();
    while let Some(upload) = pending.next() {
        match state
            .images
            .store(&tag, &upload.path, &upload.content_type)
            .await
        {
            Ok(key) => keys.push(key),
            Err(e) => {
                let rest: Vec<StagedUpload> = pending.collect();
                discard_staged(&rest).await;
                if !keys.is_empty() {
                    warn!(
                        "Upload for {} failed after storing {:?}; those objects are orphaned",
                        tag, keys
                    );
                }
                return Err(match e {
                    BlobError::InvalidKey(key) => {
                        Error::BadRequest(format!("Invalid image tag: {}", key))
                    }
                    other => Error::ImageUpload(other),
                });
            }
        }
    }

    info!("Stored {} images for {}", keys.len(), tag);
    Ok(Json(UploadResponse { keys }))
}

async fn stage_fields(
    state: &AppState,
    multipart: &mut Multipart,
    staged: &mut Vec<StagedUpload>,
) -> Result<()> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        Error::BadRequest(format!("Malformed multipart body: {}", e))
    })? {
        if field.file_name().is_none() {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            error!("Failed to read file data: {}", e);
            Error::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        let path = state
            .config
            .uploads_dir
            .join(format!("upload_{}", Uuid::new_v4()));
        fs::write(&path, &data)
            .await
            .map_err(|e| Error::Internal(format!("Failed to stage upload: {}", e)))?;

        staged.push(StagedUpload { path, content_type });
    }

    Ok(())
}

async fn discard_staged(staged: &[StagedUpload]) {
    for upload in staged {
        if let Err(e) = fs::remove_file(&upload.path).await {
            warn!("Failed to delete staged upload {:?}: {}", upload.path, e);
        }
    }
}
