use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use classroom_blob::BlobError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Image errors
    #[error("Invalid image key: {0:?}")]
    InvalidImageKey(String),
    #[error("Image fetch failed: {0}")]
    ImageFetch(BlobError),
    #[error("Image upload failed: {0}")]
    ImageUpload(BlobError),

    // Generic
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Error::InvalidImageKey(_) => (StatusCode::BAD_REQUEST, "Invalid image key".to_string()),
            // Callers only ever see a generic message; the kind goes to the log.
            Error::ImageFetch(e) => {
                error!(kind = e.kind(), "Image fetch failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Image not found".to_string())
            }
            Error::ImageUpload(e) => {
                error!(kind = e.kind(), "Image upload failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Image upload failed".to_string())
            }
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": {
                "message": error_message
            }
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<BlobError> for Error {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::InvalidKey(key) => Error::InvalidImageKey(key),
            other => Error::ImageFetch(other),
        }
    }
}
