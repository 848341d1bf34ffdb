//! Image storage for the classroom server.
//!
//! [`ObjectStore`] abstracts the remote bucket that owns every image;
//! [`ImageCache`] mirrors objects onto local disk on first use.

pub mod cache;
pub mod error;
pub mod memory;
pub mod remote;

pub use cache::{content_type_for_key, ImageCache};
pub use error::{BlobError, Result};
pub use memory::MemoryObjectStore;
pub use remote::{ObjectStore, RemoteObject, S3ObjectStore};
