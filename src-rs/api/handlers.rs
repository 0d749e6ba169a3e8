use axum::body::{boxed, Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::api::error::{AppError, ErrorBody, ROUTE_NOT_FOUND};
use crate::api::state::AppState;
use crate::task::{NewTask, SortOrder, StoreError, Task, TaskPatch, TaskStatus};

pub const TASK_NOT_FOUND: &str = "Task not found.";
pub const TITLE_REQUIRED: &str = "Title is required.";
pub const TASK_DELETED: &str = "Task deleted successfully.";

#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub message: String,
}

pub async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

/// `POST /api/tasks`
///
/// Only the title is checked here; the store's schema covers description
/// and status.
pub async fn handle_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let req: CreateTaskRequest = json_body(&headers, &body)?;

    let title = req
        .title
        .filter(|title| !title.is_empty())
        .ok_or_else(|| AppError::bad_request(TITLE_REQUIRED))?;
    let status = req
        .status
        .filter(|status| !status.is_empty())
        .unwrap_or_else(|| TaskStatus::default().to_string());
    let new_task = NewTask {
        title,
        description: req.description.unwrap_or_default(),
        status,
    };

    let store = state.store.clone();
    let task = blocking(move || store.insert(new_task)).await?;

    info!(id = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /api/tasks`, newest first.
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.store.find_all(SortOrder::NewestFirst)?;
    Ok(Json(tasks))
}

/// `PATCH /api/tasks/:id`
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Task>, AppError> {
    let patch: TaskPatch = json_body(&headers, &body)?;

    let store = state.store.clone();
    let task = blocking(move || store.find_by_id_and_update(&id, patch))
        .await?
        .ok_or_else(|| AppError::not_found(TASK_NOT_FOUND))?;

    info!(id = %task.id, "task updated");
    Ok(Json(task))
}

/// `DELETE /api/tasks/:id`
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let store = state.store.clone();
    let task = blocking(move || store.find_by_id_and_delete(&id))
        .await?
        .ok_or_else(|| AppError::not_found(TASK_NOT_FOUND))?;

    info!(id = %task.id, "task deleted");
    Ok(Json(DeleteResponse {
        message: TASK_DELETED.to_string(),
    }))
}

/// Reads a JSON body the way the client sends it. A body without a JSON
/// content type, or with no content at all, is an empty object.
fn json_body<T>(headers: &HeaderMap, body: &Bytes) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let mime = value.trim().to_ascii_lowercase();
            mime.starts_with("application/json") || mime.contains("+json")
        })
        .unwrap_or(false);

    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| AppError::bad_request(format!("Invalid JSON body: {err}")))
}

/// Store mutations may write the task file, so they run off the async workers.
async fn blocking<T, F>(op: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(op).await??)
}

pub async fn handle_route_not_found() -> Response {
    route_not_found()
}

/// Serves the client entry page for any non-API GET that is not an asset.
/// Everything else that reached no route is a 404.
pub async fn handle_fallback(State(state): State<AppState>, req: Request<Body>) -> Response {
    let is_read = req.method() == Method::GET || req.method() == Method::HEAD;
    let is_api = req.uri().path().starts_with("/api");

    match state.static_dir {
        Some(dir) if is_read && !is_api => {
            let index = dir.join("index.html");
            let assets = ServeDir::new(&dir).fallback(ServeFile::new(index));
            match assets.oneshot(req).await {
                Ok(res) => res.map(boxed),
                Err(never) => match never {},
            }
        }
        _ => route_not_found(),
    }
}

fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            msg: ROUTE_NOT_FOUND.to_string(),
        }),
    )
        .into_response()
}
