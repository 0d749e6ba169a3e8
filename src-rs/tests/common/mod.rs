//! Shared helpers for the HTTP contract tests.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use taskboard::{build_router, AppState, TaskStore};

pub fn create_test_app() -> Router {
    build_router(AppState::new(TaskStore::in_memory(), None))
}

pub fn create_test_app_with_static(dir: PathBuf) -> Router {
    build_router(AppState::new(TaskStore::in_memory(), Some(dir)))
}

pub fn create_test_app_with_store(store: TaskStore) -> Router {
    build_router(AppState::new(store, None))
}

/// Sends one request and returns the status and the raw body.
pub async fn send_raw(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json)
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, bytes.to_vec())
}

/// Sends `body` with no content type, the way a plain form or `curl -d` might.
pub async fn send_untyped(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, body.map(|v| v.to_string())).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn create_task(app: &Router, title: &str, description: &str) -> Value {
    let (status, task) = send(
        app,
        Method::POST,
        "/api/tasks",
        Some(serde_json::json!({"title": title, "description": description})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    task
}

pub async fn list_tasks(app: &Router) -> Vec<Value> {
    let (status, body) = send(app, Method::GET, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().cloned().unwrap()
}
