//! Task endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use taskboard::access::{CREATE_TASKS, require_manager};
use taskboard::domain::{Task, TaskId};

use super::types::{ApiResponse, CreateTaskRequest, StatusRequest, TaskListQuery, UpdateTaskRequest};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `UserNotFound` for a payload's assignee is a field error, not a 404.
fn assignee_error(err: taskboard::Error) -> ApiError {
    match err {
        taskboard::Error::UserNotFound(_) => {
            ApiError::field("assigned_to", "The selected assignee does not exist.")
        }
        other => other.into(),
    }
}

/// List the tasks visible to the caller.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Task>>>> {
    let Query(query) = query?;
    let tasks = state.tasks.list_tasks(&user, query.into()).await?;
    Ok(Json(ApiResponse::ok(tasks)))
}

/// Create a task.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Task>>)> {
    require_manager(&user, CREATE_TASKS)?;
    let Json(request) = payload?;
    let task = state
        .tasks
        .create_task(&user, request.into())
        .await
        .map_err(assignee_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Task created successfully.", task)),
    ))
}

/// Get a single task.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    task: Result<Path<TaskId>, PathRejection>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let Path(task_id) = task?;
    let task = state.tasks.get_task(&user, task_id).await?;
    Ok(Json(ApiResponse::ok(task)))
}

/// Update a task.
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    task: Result<Path<TaskId>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let Path(task_id) = task?;
    let Json(request) = payload?;
    let task = state
        .tasks
        .update_task(&user, task_id, request.into())
        .await
        .map_err(assignee_error)?;

    Ok(Json(ApiResponse::with_message("Task updated successfully.", task)))
}

/// Change a task's status.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    task: Result<Path<TaskId>, PathRejection>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let Path(task_id) = task?;
    let Json(request) = payload?;
    let task = state
        .tasks
        .update_status(&user, task_id, request.status)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Task status updated successfully.",
        task,
    )))
}

/// Delete a task.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    task: Result<Path<TaskId>, PathRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let Path(task_id) = task?;
    state.tasks.delete_task(&user, task_id).await?;
    Ok(Json(ApiResponse::message("Task deleted successfully.")))
}
