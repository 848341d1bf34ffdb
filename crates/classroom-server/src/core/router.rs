//! Core Router
//!
//! Chat relay, image, and ambient routes.

use crate::chat::handlers as chat_handlers;
use crate::core::AppState;
use crate::images;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new()
        // Chat relay
        .route(
            "/class/{class_id}/chat/messages",
            get(chat_handlers::get_messages).post(chat_handlers::post_message),
        )
        // Images
        .route("/image/{key}", get(images::get_image))
        .route("/images/{entity}/{entity_id}", post(images::upload_images))
        // Ambient
        .route("/welcome", get(welcome))
        .route("/health", get(health_check))
}

async fn welcome() -> Json<Value> {
    Json(json!({ "status": "success", "message": "Welcome!" }))
}

async fn health_check() -> &'static str {
    "OK - Classroom Server"
}
