//! Dependency endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use taskboard::access::{MANAGE_DEPENDENCIES, require_manager};
use taskboard::domain::{DependencyDetail, DependencyGraph, DependencyId, TaskId};

use super::types::{ApiResponse, ClearedResponse, DependencyRequest};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Add a dependency edge.
///
/// A missing task named in the body is a field error on the field that
/// named it. The role check runs before the body is looked at.
pub async fn add_dependency(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<DependencyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DependencyDetail>>)> {
    require_manager(&user, MANAGE_DEPENDENCIES)?;
    let Json(request) = payload?;

    let detail = state
        .dependencies
        .add_dependency(&user, request.task_id, request.depends_on_task_id)
        .await
        .map_err(|err| match err {
            taskboard::Error::TaskNotFound(id) => {
                let field = if id == request.task_id {
                    "task_id"
                } else {
                    "depends_on_task_id"
                };
                ApiError::field(field, format!("The selected {field} is invalid."))
            }
            other => other.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Dependency added successfully.",
            detail,
        )),
    ))
}

/// Remove a dependency edge named by its endpoints.
pub async fn remove_dependency(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<DependencyRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    require_manager(&user, MANAGE_DEPENDENCIES)?;
    let Json(request) = payload?;
    state
        .dependencies
        .remove_dependency(&user, request.task_id, request.depends_on_task_id)
        .await?;

    Ok(Json(ApiResponse::message("Dependency removed successfully.")))
}

/// Direct dependencies of a task.
pub async fn task_dependencies(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    task: Result<Path<TaskId>, PathRejection>,
) -> ApiResult<Json<ApiResponse<Vec<DependencyDetail>>>> {
    let Path(task_id) = task?;
    let dependencies = state.dependencies.dependencies(&user, task_id).await?;
    Ok(Json(ApiResponse::ok(dependencies)))
}

/// Direct dependents of a task.
pub async fn task_dependents(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    task: Result<Path<TaskId>, PathRejection>,
) -> ApiResult<Json<ApiResponse<Vec<DependencyDetail>>>> {
    let Path(task_id) = task?;
    let dependents = state.dependencies.dependents(&user, task_id).await?;
    Ok(Json(ApiResponse::ok(dependents)))
}

/// Composite dependency view of a task.
pub async fn dependency_graph(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    task: Result<Path<TaskId>, PathRejection>,
) -> ApiResult<Json<ApiResponse<DependencyGraph>>> {
    let Path(task_id) = task?;
    let graph = state.dependencies.graph(&user, task_id).await?;
    Ok(Json(ApiResponse::ok(graph)))
}

/// Remove every dependency of a task.
pub async fn clear_dependencies(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    task: Result<Path<TaskId>, PathRejection>,
) -> ApiResult<Json<ApiResponse<ClearedResponse>>> {
    require_manager(&user, MANAGE_DEPENDENCIES)?;
    let Path(task_id) = task?;
    let removed = state
        .dependencies
        .clear_dependencies(&user, task_id)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Dependencies cleared successfully.",
        ClearedResponse { removed },
    )))
}

/// Remove one dependency of a task by its id.
pub async fn remove_dependency_by_id(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ids: Result<Path<(TaskId, DependencyId)>, PathRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    require_manager(&user, MANAGE_DEPENDENCIES)?;
    let Path((task_id, dependency_id)) = ids?;
    state
        .dependencies
        .remove_dependency_by_id(&user, task_id, dependency_id)
        .await?;

    Ok(Json(ApiResponse::message("Dependency removed successfully.")))
}
