//! Request and response types for the HTTP API.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use taskboard::domain::{NewTask, TaskFilter, TaskId, TaskStatus, TaskUpdate, UserId};

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true` for successful responses
    pub success: bool,

    /// Human-readable outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// A successful response carrying data and a message.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A successful response with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Health check payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" while the server is serving
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
}

/// Result of clearing a task's dependencies.
#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    /// Number of edges removed
    pub removed: usize,
}

/// Query string of `GET /api/tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Only tasks in this status
    pub status: Option<TaskStatus>,
    /// Only tasks assigned to this user
    pub assigned_to: Option<UserId>,
}

impl From<TaskListQuery> for TaskFilter {
    fn from(query: TaskListQuery) -> Self {
        Self {
            status: query.status,
            assigned_to: query.assigned_to,
        }
    }
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Task title
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Initial status, pending if absent
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Optional due date (`YYYY-MM-DD`)
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Optional assignee
    #[serde(default)]
    pub assigned_to: Option<UserId>,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(request: CreateTaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            status: request.status,
            due_date: request.due_date,
            assigned_to: request.assigned_to,
        }
    }
}

/// Body of `PUT /api/tasks/{task}`.
///
/// Absent fields are left unchanged; `null` clears the nullable ones.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    /// New title
    #[serde(default)]
    pub title: Option<String>,
    /// New description, `null` to clear
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New status
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// New due date, `null` to clear
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    /// New assignee, `null` to unassign
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<UserId>>,
}

impl From<UpdateTaskRequest> for TaskUpdate {
    fn from(request: UpdateTaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            status: request.status,
            due_date: request.due_date,
            assigned_to: request.assigned_to,
        }
    }
}

/// Body of `PATCH /api/tasks/{task}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Target status
    pub status: TaskStatus,
}

/// Body of `POST /api/dependencies` and `DELETE /api/dependencies`.
#[derive(Debug, Deserialize)]
pub struct DependencyRequest {
    /// The dependent task
    pub task_id: TaskId,
    /// The task it depends on
    pub depends_on_task_id: TaskId,
}

/// Present-and-null becomes `Some(None)`; absent stays `None` via `default`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
