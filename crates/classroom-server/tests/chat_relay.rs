use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use classroom_blob::MemoryObjectStore;
use classroom_server::core::ServerConfig;
use classroom_server::{app, build_state};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

async fn test_app() -> (Router, TempDir) {
    let dir = tempdir().unwrap();
    let config = ServerConfig::with_base_dir(dir.path());
    let state = build_state(config, Arc::new(MemoryObjectStore::new("images")))
        .await
        .unwrap();
    (app(state), dir)
}

async fn post_json(app: &Router, uri: &str, body: &str, user: Option<&str>) -> StatusCode {
    let mut req = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        req = req.header("x-user", user);
    }
    let resp = app
        .clone()
        .oneshot(req.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    resp.status()
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_post_then_poll_with_watermark() {
    let (app, _dir) = test_app().await;

    let status = post_json(
        &app,
        "/class/42/chat/messages",
        r#"{"username":"alice","message":"hi","date":1000}"#,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(&app, "/class/42/chat/messages?since=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "messages": [{ "username": "alice", "message": "hi", "date": 1000 }] })
    );

    let (_, body) = get_json(&app, "/class/42/chat/messages?since=1000").await;
    assert_eq!(body, json!({ "messages": [] }));
}

#[tokio::test]
async fn test_missing_or_invalid_since_returns_everything() {
    let (app, _dir) = test_app().await;
    for date in [10, 20, 30] {
        let body = format!(r#"{{"username":"amy","message":"m{}","date":{}}}"#, date, date);
        post_json(&app, "/class/7/chat/messages", &body, None).await;
    }

    for uri in [
        "/class/7/chat/messages",
        "/class/7/chat/messages?since=",
        "/class/7/chat/messages?since=yesterday",
    ] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"].as_array().unwrap().len(), 3, "{}", uri);
    }

    let (_, body) = get_json(&app, "/class/7/chat/messages?since=15").await;
    let dates: Vec<i64> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["date"].as_i64().unwrap())
        .collect();
    assert_eq!(dates, vec![30, 20]);
}

#[tokio::test]
async fn test_unknown_class_is_empty() {
    let (app, _dir) = test_app().await;
    let (status, body) = get_json(&app, "/class/nobody/chat/messages?since=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "messages": [] }));
}

#[tokio::test]
async fn test_backlog_capped_over_http() {
    let (app, _dir) = test_app().await;
    for i in 1..=23 {
        let body = format!(r#"{{"username":"bob","message":"m{}","date":{}}}"#, i, i);
        post_json(&app, "/class/big/chat/messages", &body, None).await;
    }

    let (_, body) = get_json(&app, "/class/big/chat/messages?since=0").await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 20);
    assert_eq!(messages[0]["message"], "m23");
    assert_eq!(messages[19]["message"], "m4");
}

#[tokio::test]
async fn test_username_falls_back_to_request_context() {
    let (app, _dir) = test_app().await;

    post_json(
        &app,
        "/class/1/chat/messages",
        r#"{"message":"from header","date":5}"#,
        Some("carol"),
    )
    .await;

    let (_, body) = get_json(&app, "/class/1/chat/messages").await;
    assert_eq!(body["messages"][0]["username"], "carol");
}

#[tokio::test]
async fn test_bad_writes_are_acknowledged_and_dropped() {
    let (app, _dir) = test_app().await;

    // Anonymous, malformed, and wrongly typed bodies all get a plain 200.
    for body in [
        r#"{"message":"who am i","date":1}"#,
        "{ not json",
        r#"{"username":"dave","message":"x","date":"soon"}"#,
    ] {
        let status = post_json(&app, "/class/1/chat/messages", body, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = get_json(&app, "/class/1/chat/messages").await;
    assert_eq!(body, json!({ "messages": [] }));
}

#[tokio::test]
async fn test_missing_date_defaults_to_now() {
    let (app, _dir) = test_app().await;
    let before = chrono::Utc::now().timestamp_millis();

    post_json(
        &app,
        "/class/1/chat/messages",
        r#"{"username":"erin","message":"no date"}"#,
        None,
    )
    .await;

    let (_, body) = get_json(&app, "/class/1/chat/messages").await;
    assert!(body["messages"][0]["date"].as_i64().unwrap() >= before);
}

#[tokio::test]
async fn test_welcome_route() {
    let (app, _dir) = test_app().await;
    let (status, body) = get_json(&app, "/welcome").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Welcome!");
}
