//! Error types for taskboard operations.

use crate::domain::{DependencyId, TaskId, TaskStatus, UserId};
use std::io;
use thiserror::Error;

/// The error type for taskboard operations.
///
/// Display strings of the validation-class variants are the human-readable
/// reasons reported to callers.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Input failed field validation.
    #[error("{0}")]
    Validation(String),

    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// No edge between the two tasks.
    #[error("Dependency not found: task {task_id} does not depend on task {depends_on_task_id}")]
    DependencyNotFound {
        /// The dependent task
        task_id: TaskId,
        /// The task that was expected to be depended upon
        depends_on_task_id: TaskId,
    },

    /// No edge with this id belongs to the task.
    #[error("Dependency {dependency_id} not found for task {task_id}")]
    DependencyIdNotFound {
        /// The task the edge was expected to start from
        task_id: TaskId,
        /// The edge id
        dependency_id: DependencyId,
    },

    /// A task cannot depend on itself.
    #[error("A task cannot depend on itself.")]
    SelfDependency(TaskId),

    /// The edge already exists.
    #[error("This dependency already exists.")]
    DuplicateDependency {
        /// The dependent task
        task_id: TaskId,
        /// The task depended upon
        depends_on_task_id: TaskId,
    },

    /// Adding the edge would close a cycle.
    #[error("Cannot add dependency. This would create a circular dependency.")]
    CircularDependency {
        /// The dependent task
        task_id: TaskId,
        /// The task depended upon
        depends_on_task_id: TaskId,
    },

    /// The task cannot be deleted while other tasks depend on it.
    #[error("Cannot delete task because other tasks depend on it.")]
    DependentsExist {
        /// The task that was to be deleted
        task_id: TaskId,
        /// Tasks depending on it
        dependents: Vec<TaskId>,
    },

    /// The task cannot be completed while a direct dependency is unfinished.
    #[error("Cannot complete task. Some dependencies are not completed yet.")]
    IncompleteDependencies {
        /// The task that was to be completed
        task_id: TaskId,
        /// Direct dependencies that are not completed
        pending: Vec<TaskId>,
    },

    /// The status change is not part of the task lifecycle.
    #[error("Cannot change task status from {from} to {to}.")]
    InvalidStatusTransition {
        /// Current status
        from: TaskStatus,
        /// Requested status
        to: TaskStatus,
    },

    /// The actor may not perform the operation.
    #[error("{0}")]
    Forbidden(String),
}

impl Error {
    /// Whether the error comes from the persistence layer rather than from
    /// the request itself.
    ///
    /// Store failures are logged in full and reported to callers opaquely.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Json(_) | Error::Storage(_) | Error::Config(_)
        )
    }
}

/// A specialized Result type for taskboard operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        let err = Error::DuplicateDependency {
            task_id: TaskId(1),
            depends_on_task_id: TaskId(2),
        };
        assert_eq!(err.to_string(), "This dependency already exists.");

        let err = Error::CircularDependency {
            task_id: TaskId(1),
            depends_on_task_id: TaskId(2),
        };
        assert_eq!(
            err.to_string(),
            "Cannot add dependency. This would create a circular dependency."
        );

        let err = Error::InvalidStatusTransition {
            from: TaskStatus::Completed,
            to: TaskStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Cannot change task status from completed to pending."
        );
    }

    #[test]
    fn test_store_failure_classification() {
        assert!(Error::Storage("disk full".into()).is_store_failure());
        assert!(Error::Io(io::Error::other("boom")).is_store_failure());
        assert!(!Error::SelfDependency(TaskId(5)).is_store_failure());
        assert!(!Error::TaskNotFound(TaskId(5)).is_store_failure());
    }
}
