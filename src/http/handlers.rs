//! Request handlers for the task API.
//!
//! Bodies are taken as raw bytes and parsed leniently: anything that is not
//! a JSON object is treated as an empty object and left to validation.

use super::{
    dto::{HealthResponse, MoveResponse, SuccessResponse, TaskResponse},
    error::ApiError,
};
use crate::task::{
    domain::{TaskId, TaskPayload},
    ports::TaskRepository,
    services::TaskService,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

const DIRECTION_FIELD: &str = "direction";

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

fn parse_id(raw: &str) -> ApiResult<TaskId> {
    TaskId::try_from(raw).map_err(|_| ApiError::NotFound)
}

/// `GET /api/health`
#[expect(clippy::unused_async, reason = "axum handlers must be async")]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// `GET /api/tarefas`
pub async fn list_tasks<R>(
    State(service): State<TaskService<R>>,
) -> ApiResult<Json<Vec<TaskResponse>>>
where
    R: TaskRepository + 'static,
{
    let tasks = service.list().await?;
    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

/// `POST /api/tarefas`
pub async fn create_task<R>(
    State(service): State<TaskService<R>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<TaskResponse>)>
where
    R: TaskRepository + 'static,
{
    let payload = TaskPayload::from_json_slice(&body);
    let created = service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(&created))))
}

/// `PUT /api/tarefas/{id}`
pub async fn update_task<R>(
    State(service): State<TaskService<R>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<TaskResponse>>
where
    R: TaskRepository + 'static,
{
    let id = parse_id(&raw_id)?;
    let payload = TaskPayload::from_json_slice(&body);
    let updated = service.update(id, &payload).await?;
    Ok(Json(TaskResponse::from(&updated)))
}

/// `DELETE /api/tarefas/{id}`
pub async fn delete_task<R>(
    State(service): State<TaskService<R>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<SuccessResponse>>
where
    R: TaskRepository + 'static,
{
    let id = parse_id(&raw_id)?;
    service.delete(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// `PATCH /api/tarefas/{id}/mover`
///
/// A missing or non-string `direction` is rejected like an unknown one.
pub async fn move_task<R>(
    State(service): State<TaskService<R>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<MoveResponse>>
where
    R: TaskRepository + 'static,
{
    let id = parse_id(&raw_id)?;
    let payload = TaskPayload::from_json_slice(&body);
    let direction = payload
        .get(DIRECTION_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default();
    let outcome = service.move_task(id, direction).await?;
    Ok(Json(MoveResponse {
        success: true,
        swapped: outcome.swapped(),
    }))
}
