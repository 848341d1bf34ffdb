//! Core Service Layer
//!
//! Shared infrastructure for the classroom server: configuration, app
//! state, request context, errors, and routing.

pub mod config;
pub mod ctx;
pub mod error;
pub mod router;

// Re-exports for convenience
pub use config::{AppState, ServerConfig};
pub use ctx::Ctx;
pub use error::{Error, Result};
pub use router::router;
