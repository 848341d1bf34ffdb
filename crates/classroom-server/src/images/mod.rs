//! Image endpoints
//!
//! Serving goes through the read-through [`classroom_blob::ImageCache`];
//! uploads are staged on disk, then pushed to the remote store one by one.

pub mod handlers;

pub use handlers::{get_image, upload_images, UploadResponse};
