//! Domain types for task tracking.
//!
//! This module contains the core domain types for the taskboard: tasks,
//! users, dependency edges and the derived graph views built from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a task title, in characters
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length of a task description, in characters
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Returns the raw numeric id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Unique identifier for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Surrogate identifier of a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyId(pub u64);

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DependencyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has not been started
    Pending,

    /// Task is currently being worked on
    InProgress,

    /// Task has been finished
    Completed,

    /// Task was abandoned. Not `Completed`, so it still blocks dependents.
    Canceled,
}

impl TaskStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Canceled,
    ];

    /// Wire name of the status
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Canceled => "canceled",
        }
    }

    /// Whether a task may move from this status to `next`.
    ///
    /// Staying in the same status is not a transition and is handled by the
    /// caller as a no-op.
    ///
    /// | from \ to   | pending | in_progress | completed | canceled |
    /// |-------------|---------|-------------|-----------|----------|
    /// | pending     | -       | yes         | yes       | yes      |
    /// | in_progress | yes     | -           | yes       | yes      |
    /// | completed   | no      | yes         | -         | no       |
    /// | canceled    | yes     | no          | no        | -        |
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::{Canceled, Completed, InProgress, Pending};

        matches!(
            (self, next),
            (Pending, InProgress | Completed | Canceled)
                | (InProgress, Pending | Completed | Canceled)
                | (Completed, InProgress)
                | (Canceled, Pending)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "canceled" | "cancelled" => Ok(TaskStatus::Canceled),
            other => Err(format!(
                "Invalid status '{}'. Must be one of: pending, in_progress, completed, canceled",
                other
            )),
        }
    }
}

/// Role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates, assigns and deletes tasks; manages dependencies
    Manager,

    /// Works on the tasks assigned to them
    User,
}

/// A user of the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Role of the user
    pub role: Role,
}

impl User {
    /// Whether the user holds the manager role
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}

/// Represents a task in the tracking system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for the task
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Task description (optional)
    pub description: Option<String>,

    /// Current status
    pub status: TaskStatus,

    /// Due date (optional)
    pub due_date: Option<NaiveDate>,

    /// Assignee (optional)
    pub assigned_to: Option<UserId>,

    /// Creator; never changes after creation
    pub created_by: UserId,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether the task is assigned to the given user
    pub fn is_assigned_to(&self, user: UserId) -> bool {
        self.assigned_to == Some(user)
    }

    /// Validates the task fields.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())
    }
}

/// Compact view of a task, used wherever a task is referenced from another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Task id
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Current status
    pub status: TaskStatus,

    /// Assignee (optional)
    pub assigned_to: Option<UserId>,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            status: task.status,
            assigned_to: task.assigned_to,
        }
    }
}

/// Data for creating a new task
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Task title
    pub title: String,

    /// Task description (optional)
    pub description: Option<String>,

    /// Initial status; defaults to pending
    pub status: Option<TaskStatus>,

    /// Due date (optional)
    pub due_date: Option<NaiveDate>,

    /// Assignee (optional)
    pub assigned_to: Option<UserId>,
}

impl NewTask {
    /// Creates a pending, unassigned task with only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: None,
            due_date: None,
            assigned_to: None,
        }
    }

    /// Validates the new task data.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())
    }
}

/// Data for updating an existing task
///
/// Double options distinguish "leave unchanged" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    /// New title (if updating)
    pub title: Option<String>,

    /// New description (if updating, `Some(None)` to clear)
    pub description: Option<Option<String>>,

    /// New status (if updating)
    pub status: Option<TaskStatus>,

    /// New due date (if updating, `Some(None)` to clear)
    pub due_date: Option<Option<NaiveDate>>,

    /// New assignee (if updating, `Some(None)` to unassign)
    pub assigned_to: Option<Option<UserId>>,
}

impl TaskUpdate {
    /// An update that only changes the status
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Whether the update touches nothing but the status
    pub fn is_status_only(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
    }

    /// Whether the update changes nothing at all
    pub fn is_empty(&self) -> bool {
        self.is_status_only() && self.status.is_none()
    }
}

/// Filter for querying tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Filter by status
    pub status: Option<TaskStatus>,

    /// Filter by assignee
    pub assigned_to: Option<UserId>,
}

impl TaskFilter {
    /// Whether the task passes the filter
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(assignee) = self.assigned_to {
            if !task.is_assigned_to(assignee) {
                return false;
            }
        }
        true
    }
}

/// A directed dependency edge: `task_id` cannot complete before
/// `depends_on_task_id` is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Surrogate id of the edge
    pub id: DependencyId,

    /// The dependent task (source of the edge)
    pub task_id: TaskId,

    /// The task that must finish first (target of the edge)
    pub depends_on_task_id: TaskId,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A dependency edge with both endpoint tasks resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDetail {
    /// The edge itself
    #[serde(flatten)]
    pub dependency: Dependency,

    /// The dependent task
    pub task: TaskSummary,

    /// The task depended upon
    pub depends_on_task: TaskSummary,
}

/// Composite read-only view of a task's neighbourhood in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// The task at the centre of the view
    pub task: TaskSummary,

    /// Tasks this task depends on directly
    pub dependencies: Vec<TaskSummary>,

    /// Tasks that depend on this task directly
    pub dependents: Vec<TaskSummary>,

    /// Whether every direct dependency is completed
    pub can_be_completed: bool,
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {} characters",
            MAX_TITLE_LENGTH
        ));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), String> {
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(format!(
                "Description cannot exceed {} characters",
                MAX_DESCRIPTION_LENGTH
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaskStatus::Pending, TaskStatus::InProgress, true)]
    #[case(TaskStatus::Pending, TaskStatus::Completed, true)]
    #[case(TaskStatus::InProgress, TaskStatus::Pending, true)]
    #[case(TaskStatus::InProgress, TaskStatus::Canceled, true)]
    #[case(TaskStatus::Completed, TaskStatus::InProgress, true)]
    #[case(TaskStatus::Completed, TaskStatus::Pending, false)]
    #[case(TaskStatus::Completed, TaskStatus::Canceled, false)]
    #[case(TaskStatus::Canceled, TaskStatus::Pending, true)]
    #[case(TaskStatus::Canceled, TaskStatus::Completed, false)]
    fn test_status_transitions(
        #[case] from: TaskStatus,
        #[case] to: TaskStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_status_never_transitions_to_itself() {
        for status in TaskStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[rstest]
    #[case("pending", TaskStatus::Pending)]
    #[case("in_progress", TaskStatus::InProgress)]
    #[case("In-Progress", TaskStatus::InProgress)]
    #[case("completed", TaskStatus::Completed)]
    #[case("cancelled", TaskStatus::Canceled)]
    fn test_status_from_str(#[case] input: &str, #[case] expected: TaskStatus) {
        assert_eq!(input.parse::<TaskStatus>().unwrap(), expected);
    }

    #[test]
    fn test_status_from_str_rejects_unknown() {
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_new_task_validation() {
        assert!(NewTask::titled("Write report").validate().is_ok());
        assert!(NewTask::titled("   ").validate().is_err());
        assert!(NewTask::titled("x".repeat(MAX_TITLE_LENGTH + 1))
            .validate()
            .is_err());

        let mut task = NewTask::titled("Write report");
        task.description = Some("d".repeat(MAX_DESCRIPTION_LENGTH + 1));
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_update_is_status_only() {
        assert!(TaskUpdate::status(TaskStatus::Completed).is_status_only());
        assert!(TaskUpdate::default().is_empty());

        let update = TaskUpdate {
            assigned_to: Some(None),
            ..Default::default()
        };
        assert!(!update.is_status_only());
    }

    #[test]
    fn test_dependency_detail_flattens_edge() {
        let now = Utc::now();
        let task = Task {
            id: TaskId(1),
            title: "A".to_string(),
            description: None,
            status: TaskStatus::Pending,
            due_date: None,
            assigned_to: None,
            created_by: UserId(1),
            created_at: now,
            updated_at: now,
        };
        let mut other = task.clone();
        other.id = TaskId(2);

        let detail = DependencyDetail {
            dependency: Dependency {
                id: DependencyId(7),
                task_id: TaskId(1),
                depends_on_task_id: TaskId(2),
                created_at: now,
            },
            task: (&task).into(),
            depends_on_task: (&other).into(),
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["task_id"], 1);
        assert_eq!(value["depends_on_task_id"], 2);
        assert_eq!(value["depends_on_task"]["id"], 2);
    }
}
