use crate::chat::{parse_since, ChatMessage};
use crate::core::{AppState, Ctx};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct PostMessageInput {
    pub username: Option<String>,
    pub message: String,
    pub date: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SinceQuery {
    pub since: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<ChatMessage>,
}

/// POST /class/{class_id}/chat/messages
///
/// Fire-and-forget: always answers 200, malformed input is dropped.
pub async fn post_message(
    Path(class_id): Path<String>,
    State(state): State<AppState>,
    ctx: Ctx,
    input: Result<Json<PostMessageInput>, JsonRejection>,
) -> StatusCode {
    let Json(input) = match input {
        Ok(input) => input,
        Err(e) => {
            debug!("Dropping malformed chat message for class {}: {}", class_id, e);
            return StatusCode::OK;
        }
    };

    let username = match input.username.filter(|u| !u.is_empty()) {
        Some(username) => username,
        None => match ctx.username() {
            Some(username) => username.to_string(),
            None => {
                debug!("Dropping anonymous chat message for class {}", class_id);
                return StatusCode::OK;
            }
        },
    };

    info!("POST /class/{}/chat/messages from {}", class_id, username);

    state.chat.append(
        &class_id,
        ChatMessage {
            username,
            message: input.message,
            date: input.date.unwrap_or_else(|| Utc::now().timestamp_millis()),
        },
    );

    StatusCode::OK
}

/// GET /class/{class_id}/chat/messages?since={ts}
pub async fn get_messages(
    Path(class_id): Path<String>,
    State(state): State<AppState>,
    query: Result<Query<SinceQuery>, QueryRejection>,
) -> Json<MessagesResponse> {
    let since = match &query {
        Ok(Query(q)) => parse_since(q.since.as_deref()),
        Err(_) => 0,
    };

    let messages = state.chat.messages_since(&class_id, since);
    debug!(
        "GET /class/{}/chat/messages since={} -> {} messages",
        class_id,
        since,
        messages.len()
    );

    Json(MessagesResponse { messages })
}
