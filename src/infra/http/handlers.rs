//! Task endpoint handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::error::TaskError;
use crate::domain::task::Task;

use super::AppState;
use super::error::{ApiError, task_error_to_api};

/// Create/update payload. Fields default to empty so a missing field fails
/// domain validation with a 400 instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskPayload {
    pub name: String,
    pub description: String,
}

pub async fn create_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let task = Task::new(id, payload.name, payload.description)
        .map_err(|err| task_error_to_api(err.into()))?;

    let created = state.tasks.create(task).await.map_err(task_error_to_api)?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(id)?;

    let task = state.tasks.get(id).await.map_err(task_error_to_api)?;
    Ok(Json(task))
}

pub async fn list_tasks(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tasks = state.tasks.get_all().await.map_err(task_error_to_api)?;
    Ok(Json(tasks))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let task = Task::new(id, payload.name, payload.description)
        .map_err(|err| task_error_to_api(err.into()))?;

    let updated = state.tasks.update(task).await.map_err(task_error_to_api)?;

    Ok(Json(updated))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(id)?;

    state.tasks.delete(id).await.map_err(task_error_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_id(id: i64) -> Result<(), ApiError> {
    if id <= 0 {
        return Err(task_error_to_api(TaskError::Validation(
            "task id must be greater than zero".to_string(),
        )));
    }
    Ok(())
}
