//! Task lifecycle service.
//!
//! Creation, updates, status transitions and deletion of tasks. Status
//! changes consult the dependency graph (a task can only be completed once
//! all of its direct dependencies are) and deletion consults dependents, so
//! both run under the same write guard as the dependency engine's mutations.

use crate::access::{
    CREATE_TASKS, ensure_can_update, ensure_can_update_status, ensure_can_view, require_manager,
};
use crate::domain::{NewTask, Task, TaskFilter, TaskId, TaskStatus, TaskUpdate, User, UserId};
use crate::engine::{commit, find_task, pending_dependencies};
use crate::error::{Error, Result};
use crate::storage::{SharedStorage, Storage, TaskStore};
use crate::users::UserDirectory;
use std::sync::Arc;
use tracing::debug;

/// Runs the task lifecycle on behalf of authenticated users.
#[derive(Clone)]
pub struct TaskService {
    storage: SharedStorage,
    users: Arc<UserDirectory>,
}

impl TaskService {
    /// Create a service over shared storage and the known users.
    pub fn new(storage: SharedStorage, users: Arc<UserDirectory>) -> Self {
        Self { storage, users }
    }

    /// Create a task. The actor becomes its creator.
    ///
    /// # Errors
    ///
    /// - `Error::Forbidden` unless the actor is a manager
    /// - `Error::UserNotFound` if the assignee is unknown
    /// - `Error::Validation` if the title or description is invalid
    pub async fn create_task(&self, actor: &User, new_task: NewTask) -> Result<Task> {
        require_manager(actor, CREATE_TASKS)?;
        if let Some(assignee) = new_task.assigned_to {
            self.ensure_user_exists(assignee)?;
        }

        let mut storage = self.storage.write().await;
        let task = storage.create_task(new_task, actor.id).await?;
        commit(storage.as_mut(), "create_task", actor, &[task.id], None).await?;

        debug!(task_id = %task.id, actor = %actor.id, "Created task");
        Ok(task)
    }

    /// Get a task visible to the actor.
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if the task does not exist
    /// - `Error::Forbidden` unless the actor is a manager or the assignee
    pub async fn get_task(&self, actor: &User, id: TaskId) -> Result<Task> {
        let storage = self.storage.read().await;
        let task = find_task(storage.as_ref(), id).await?;
        ensure_can_view(actor, &task)?;
        Ok(task)
    }

    /// List the tasks visible to the actor that match the filter.
    ///
    /// Managers see every task; other users only see tasks assigned to them,
    /// whatever assignee the filter asks for.
    pub async fn list_tasks(&self, actor: &User, filter: TaskFilter) -> Result<Vec<Task>> {
        let mut filter = filter;
        if !actor.is_manager() {
            match filter.assigned_to {
                Some(assignee) if assignee != actor.id => return Ok(Vec::new()),
                _ => filter.assigned_to = Some(actor.id),
            }
        }

        let storage = self.storage.read().await;
        storage.list_tasks(&filter).await
    }

    /// Update a task.
    ///
    /// Managers may change any field; the assignee may only change the
    /// status. A status change follows the same rules as
    /// [`update_status`](Self::update_status).
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if the task does not exist
    /// - `Error::Forbidden` if the actor may not apply this update
    /// - `Error::UserNotFound` if the new assignee is unknown
    /// - `Error::InvalidStatusTransition` or `Error::IncompleteDependencies`
    ///   for a rejected status change
    /// - `Error::Validation` if the updated task is invalid
    pub async fn update_task(&self, actor: &User, id: TaskId, update: TaskUpdate) -> Result<Task> {
        let mut update = update;
        let mut storage = self.storage.write().await;

        let task = find_task(storage.as_ref(), id).await?;
        ensure_can_update(actor, &task, &update)?;

        if let Some(Some(assignee)) = update.assigned_to {
            self.ensure_user_exists(assignee)?;
        }
        if let Some(status) = update.status {
            if status == task.status {
                update.status = None;
            } else {
                check_status_change(storage.as_ref(), &task, status).await?;
            }
        }
        if update.is_empty() {
            return Ok(task);
        }

        let updated = storage.update_task(id, update).await?;
        commit(storage.as_mut(), "update_task", actor, &[id], None).await?;

        debug!(task_id = %id, actor = %actor.id, "Updated task");
        Ok(updated)
    }

    /// Move a task to a new status.
    ///
    /// Setting the current status again succeeds without changing anything.
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if the task does not exist
    /// - `Error::Forbidden` unless the actor is a manager or the assignee
    /// - `Error::InvalidStatusTransition` if the lifecycle forbids the move
    /// - `Error::IncompleteDependencies` when completing a task whose direct
    ///   dependencies are not all completed
    pub async fn update_status(&self, actor: &User, id: TaskId, status: TaskStatus) -> Result<Task> {
        let mut storage = self.storage.write().await;

        let task = find_task(storage.as_ref(), id).await?;
        ensure_can_update_status(actor, &task)?;

        if task.status == status {
            return Ok(task);
        }
        check_status_change(storage.as_ref(), &task, status).await?;

        let updated = storage.update_task(id, TaskUpdate::status(status)).await?;
        commit(storage.as_mut(), "update_status", actor, &[id], None).await?;

        debug!(
            task_id = %id,
            from = %task.status,
            to = %status,
            actor = %actor.id,
            "Changed task status"
        );
        Ok(updated)
    }

    /// Delete a task and its outgoing dependency edges.
    ///
    /// # Errors
    ///
    /// - `Error::Forbidden` unless the actor is a manager
    /// - `Error::TaskNotFound` if the task does not exist
    /// - `Error::DependentsExist` if other tasks depend on it
    pub async fn delete_task(&self, actor: &User, id: TaskId) -> Result<()> {
        require_manager(actor, "delete tasks")?;

        let mut storage = self.storage.write().await;
        storage.delete_task(id).await?;
        commit(storage.as_mut(), "delete_task", actor, &[id], None).await?;

        debug!(task_id = %id, actor = %actor.id, "Deleted task");
        Ok(())
    }

    fn ensure_user_exists(&self, id: UserId) -> Result<()> {
        if self.users.contains(id) {
            Ok(())
        } else {
            Err(Error::UserNotFound(id))
        }
    }
}

/// Validate a move to a different status, including the completion gate.
async fn check_status_change(storage: &dyn Storage, task: &Task, next: TaskStatus) -> Result<()> {
    if !task.status.can_transition_to(next) {
        return Err(Error::InvalidStatusTransition {
            from: task.status,
            to: next,
        });
    }

    if next == TaskStatus::Completed {
        let pending = pending_dependencies(storage, task.id).await?;
        if !pending.is_empty() {
            return Err(Error::IncompleteDependencies {
                task_id: task.id,
                pending,
            });
        }
    }

    Ok(())
}
