//! Error types for object storage and the image cache.

use std::io;
use thiserror::Error;

/// Result type for blob operations.
pub type Result<T> = std::result::Result<T, BlobError>;

/// Errors that can occur while storing or resolving images.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BlobError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transient I/O error: {0}")]
    TransientIo(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid object key: {0:?}")]
    InvalidKey(String),
}

impl From<object_store::Error> for BlobError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => BlobError::NotFound(path),
            object_store::Error::PermissionDenied { path, .. }
            | object_store::Error::Unauthenticated { path, .. } => {
                BlobError::PermissionDenied(path)
            }
            other => BlobError::TransientIo(other.to_string()),
        }
    }
}

impl BlobError {
    /// Check if a later attempt could succeed.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, BlobError::TransientIo(_) | BlobError::Io(_))
    }

    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound(_))
    }

    /// Short, stable label for the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            BlobError::NotFound(_) => "not_found",
            BlobError::PermissionDenied(_) => "permission_denied",
            BlobError::TransientIo(_) | BlobError::Io(_) => "transient_io",
            BlobError::InvalidKey(_) => "invalid_key",
        }
    }
}
