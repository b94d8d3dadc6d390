//! Role rules shared by the task and dependency services.
//!
//! Managers may do everything. Other users may read the tasks assigned to
//! them and change the status of those tasks, nothing else.

use crate::domain::{Task, TaskUpdate, User};
use crate::error::{Error, Result};

/// Action named when a non-manager touches dependency edges.
pub const MANAGE_DEPENDENCIES: &str = "manage task dependencies";

/// Action named when a non-manager creates a task.
pub const CREATE_TASKS: &str = "create tasks";

/// Fails unless the actor is a manager.
///
/// `action` completes the sentence "Only managers can ...".
pub fn require_manager(actor: &User, action: &str) -> Result<()> {
    if actor.is_manager() {
        Ok(())
    } else {
        Err(Error::Forbidden(format!("Only managers can {action}.")))
    }
}

/// Fails unless the actor may read the task and its dependency edges.
pub fn ensure_can_view(actor: &User, task: &Task) -> Result<()> {
    if actor.is_manager() || task.is_assigned_to(actor.id) {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "You do not have access to this task.".to_string(),
        ))
    }
}

/// Fails unless the actor may change the task's status.
pub fn ensure_can_update_status(actor: &User, task: &Task) -> Result<()> {
    if actor.is_manager() || task.is_assigned_to(actor.id) {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "You can only update the status of tasks assigned to you.".to_string(),
        ))
    }
}

/// Fails unless the actor may apply `update` to the task.
///
/// Assignees are limited to status-only updates.
pub fn ensure_can_update(actor: &User, task: &Task, update: &TaskUpdate) -> Result<()> {
    if actor.is_manager() {
        return Ok(());
    }
    ensure_can_update_status(actor, task)?;
    if update.is_status_only() {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "You can only update the status of tasks assigned to you.".to_string(),
        ))
    }
}
