//! Dependency graph engine.
//!
//! Maintains the dependency edges between tasks and answers completion
//! readiness queries. All mutations run under the write guard of the shared
//! storage, so the cycle check and the insert it guards are never interleaved
//! with another mutation.
//!
//! # Invariants
//!
//! - No task depends on itself
//! - At most one edge per ordered pair of tasks
//! - The edge set never contains a directed cycle
//!
//! # Atomicity
//!
//! A mutation either persists completely or leaves the last saved state in
//! place: when `save()` fails the storage is reloaded before the error is
//! returned.

use crate::access::{MANAGE_DEPENDENCIES, ensure_can_view, require_manager};
use crate::cycle::would_create_cycle;
use crate::domain::{
    Dependency, DependencyDetail, DependencyGraph, DependencyId, Task, TaskId, TaskStatus,
    TaskSummary, User,
};
use crate::error::{Error, Result};
use crate::storage::{DependencyStore, SharedStorage, Storage, TaskStore};
use tracing::{debug, error};

/// Orchestrates dependency edge mutations and graph queries.
#[derive(Clone)]
pub struct DependencyEngine {
    storage: SharedStorage,
}

impl DependencyEngine {
    /// Create an engine over shared storage.
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Add the edge `task_id -> depends_on_task_id`.
    ///
    /// Checks run in a fixed order: self-dependency, existence of both tasks,
    /// duplicate, cycle. The edge is persisted only if all of them pass.
    ///
    /// # Errors
    ///
    /// - `Error::Forbidden` unless the actor is a manager
    /// - `Error::SelfDependency`, `Error::TaskNotFound`,
    ///   `Error::DuplicateDependency`, `Error::CircularDependency` as above
    /// - A store failure if the edge could not be persisted
    pub async fn add_dependency(
        &self,
        actor: &User,
        task_id: TaskId,
        depends_on_task_id: TaskId,
    ) -> Result<DependencyDetail> {
        require_manager(actor, MANAGE_DEPENDENCIES)?;

        let mut storage = self.storage.write().await;

        if task_id == depends_on_task_id {
            return Err(Error::SelfDependency(task_id));
        }

        let task = find_task(storage.as_ref(), task_id).await?;
        let depends_on_task = find_task(storage.as_ref(), depends_on_task_id).await?;

        if storage.edge_exists(task_id, depends_on_task_id).await? {
            return Err(Error::DuplicateDependency {
                task_id,
                depends_on_task_id,
            });
        }

        if would_create_cycle(storage.as_ref(), task_id, depends_on_task_id).await? {
            return Err(Error::CircularDependency {
                task_id,
                depends_on_task_id,
            });
        }

        let dependency = storage.create_edge(task_id, depends_on_task_id).await?;
        commit(
            storage.as_mut(),
            "add_dependency",
            actor,
            &[task_id, depends_on_task_id],
            Some(dependency.id),
        )
        .await?;

        debug!(
            %task_id,
            %depends_on_task_id,
            dependency_id = %dependency.id,
            actor = %actor.id,
            "Added dependency"
        );

        Ok(DependencyDetail {
            dependency,
            task: TaskSummary::from(&task),
            depends_on_task: TaskSummary::from(&depends_on_task),
        })
    }

    /// Remove the edge `task_id -> depends_on_task_id`.
    ///
    /// # Errors
    ///
    /// - `Error::Forbidden` unless the actor is a manager
    /// - `Error::DependencyNotFound` if the edge does not exist
    pub async fn remove_dependency(
        &self,
        actor: &User,
        task_id: TaskId,
        depends_on_task_id: TaskId,
    ) -> Result<Dependency> {
        require_manager(actor, MANAGE_DEPENDENCIES)?;

        let mut storage = self.storage.write().await;
        let dependency = storage.delete_edge(task_id, depends_on_task_id).await?;
        commit(
            storage.as_mut(),
            "remove_dependency",
            actor,
            &[task_id, depends_on_task_id],
            Some(dependency.id),
        )
        .await?;

        debug!(%task_id, %depends_on_task_id, actor = %actor.id, "Removed dependency");
        Ok(dependency)
    }

    /// Remove an edge of `task_id` by its surrogate id.
    ///
    /// # Errors
    ///
    /// - `Error::Forbidden` unless the actor is a manager
    /// - `Error::TaskNotFound` if the task does not exist
    /// - `Error::DependencyIdNotFound` if no edge with this id starts at the task
    pub async fn remove_dependency_by_id(
        &self,
        actor: &User,
        task_id: TaskId,
        dependency_id: DependencyId,
    ) -> Result<Dependency> {
        require_manager(actor, MANAGE_DEPENDENCIES)?;

        let mut storage = self.storage.write().await;
        find_task(storage.as_ref(), task_id).await?;

        let not_found = Error::DependencyIdNotFound {
            task_id,
            dependency_id,
        };
        match storage.get_edge(dependency_id).await? {
            Some(edge) if edge.task_id == task_id => {}
            _ => return Err(not_found),
        }

        let dependency = storage
            .delete_edge_by_id(dependency_id)
            .await?
            .ok_or(not_found)?;
        commit(
            storage.as_mut(),
            "remove_dependency_by_id",
            actor,
            &[task_id, dependency.depends_on_task_id],
            Some(dependency_id),
        )
        .await?;

        debug!(
            %task_id,
            depends_on_task_id = %dependency.depends_on_task_id,
            %dependency_id,
            actor = %actor.id,
            "Removed dependency"
        );
        Ok(dependency)
    }

    /// Remove every edge where `task_id` is the dependent.
    ///
    /// Edges pointing at the task are left alone. Returns the number of edges
    /// removed.
    ///
    /// # Errors
    ///
    /// - `Error::Forbidden` unless the actor is a manager
    /// - `Error::TaskNotFound` if the task does not exist
    pub async fn clear_dependencies(&self, actor: &User, task_id: TaskId) -> Result<usize> {
        require_manager(actor, MANAGE_DEPENDENCIES)?;

        let mut storage = self.storage.write().await;
        find_task(storage.as_ref(), task_id).await?;

        let removed = storage.delete_all_edges_for_task(task_id).await?;
        if removed > 0 {
            commit(storage.as_mut(), "clear_dependencies", actor, &[task_id], None).await?;
        }

        debug!(%task_id, removed, actor = %actor.id, "Cleared dependencies");
        Ok(removed)
    }

    /// Whether every direct dependency of the task is completed.
    ///
    /// One hop only. Recomputed on every call.
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if the task does not exist
    pub async fn can_be_completed(&self, task_id: TaskId) -> Result<bool> {
        let storage = self.storage.read().await;
        find_task(storage.as_ref(), task_id).await?;
        Ok(pending_dependencies(storage.as_ref(), task_id)
            .await?
            .is_empty())
    }

    /// Direct dependencies of a task, with the depended-upon task resolved.
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if the task does not exist
    /// - `Error::Forbidden` unless the actor is a manager or the assignee
    pub async fn dependencies(&self, actor: &User, task_id: TaskId) -> Result<Vec<DependencyDetail>> {
        let storage = self.storage.read().await;
        let task = find_task(storage.as_ref(), task_id).await?;
        ensure_can_view(actor, &task)?;

        let summary = TaskSummary::from(&task);
        let mut details = Vec::new();
        for dependency in storage.dependencies_of(task_id).await? {
            let other = find_task(storage.as_ref(), dependency.depends_on_task_id).await?;
            details.push(DependencyDetail {
                dependency,
                task: summary.clone(),
                depends_on_task: TaskSummary::from(&other),
            });
        }
        Ok(details)
    }

    /// Direct dependents of a task, with the dependent task resolved.
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if the task does not exist
    /// - `Error::Forbidden` unless the actor is a manager or the assignee
    pub async fn dependents(&self, actor: &User, task_id: TaskId) -> Result<Vec<DependencyDetail>> {
        let storage = self.storage.read().await;
        let task = find_task(storage.as_ref(), task_id).await?;
        ensure_can_view(actor, &task)?;

        let summary = TaskSummary::from(&task);
        let mut details = Vec::new();
        for dependency in storage.dependents_of(task_id).await? {
            let other = find_task(storage.as_ref(), dependency.task_id).await?;
            details.push(DependencyDetail {
                dependency,
                task: TaskSummary::from(&other),
                depends_on_task: summary.clone(),
            });
        }
        Ok(details)
    }

    /// Composite view of a task's direct neighbourhood.
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if the task does not exist
    /// - `Error::Forbidden` unless the actor is a manager or the assignee
    pub async fn graph(&self, actor: &User, task_id: TaskId) -> Result<DependencyGraph> {
        let storage = self.storage.read().await;
        let task = find_task(storage.as_ref(), task_id).await?;
        ensure_can_view(actor, &task)?;

        let mut dependencies = Vec::new();
        let mut can_be_completed = true;
        for id in storage.outgoing_edges(task_id).await? {
            let other = find_task(storage.as_ref(), id).await?;
            can_be_completed &= other.status == TaskStatus::Completed;
            dependencies.push(TaskSummary::from(&other));
        }

        let mut dependents = Vec::new();
        for id in storage.edges_to(task_id).await? {
            let other = find_task(storage.as_ref(), id).await?;
            dependents.push(TaskSummary::from(&other));
        }

        Ok(DependencyGraph {
            task: TaskSummary::from(&task),
            dependencies,
            dependents,
            can_be_completed,
        })
    }
}

/// Load a task or fail with `Error::TaskNotFound`.
pub(crate) async fn find_task(storage: &dyn Storage, id: TaskId) -> Result<Task> {
    storage.get_task(id).await?.ok_or(Error::TaskNotFound(id))
}

/// Direct dependencies of a task that are not completed, in ascending id order.
pub(crate) async fn pending_dependencies(
    storage: &dyn Storage,
    task_id: TaskId,
) -> Result<Vec<TaskId>> {
    let mut pending = Vec::new();
    for id in storage.outgoing_edges(task_id).await? {
        let completed = storage
            .get_task(id)
            .await?
            .is_some_and(|task| task.status == TaskStatus::Completed);
        if !completed {
            pending.push(id);
        }
    }
    Ok(pending)
}

/// Persist the changes made under the current write guard.
///
/// On failure the storage is reloaded from its last saved state, so the
/// caller's in-memory changes are discarded, and the save error is returned.
/// `task_ids` and `dependency_id` name the records the mutation touched and
/// only feed the failure log.
pub(crate) async fn commit(
    storage: &mut dyn Storage,
    operation: &str,
    actor: &User,
    task_ids: &[TaskId],
    dependency_id: Option<DependencyId>,
) -> Result<()> {
    let Err(e) = storage.save().await else {
        return Ok(());
    };

    error!(
        operation,
        actor = %actor.id,
        ?task_ids,
        ?dependency_id,
        error = %e,
        "Failed to persist changes, restoring last saved state"
    );
    if let Err(reload_error) = storage.reload().await {
        error!(
            operation,
            actor = %actor.id,
            ?task_ids,
            error = %reload_error,
            "Failed to restore last saved state"
        );
    }
    Err(e)
}
