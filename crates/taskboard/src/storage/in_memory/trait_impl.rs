//! Storage trait implementations for in-memory storage.

use super::graph::edges_of;
use super::InMemoryStore;
use crate::domain::{
    Dependency, DependencyId, NewTask, Task, TaskFilter, TaskId, TaskStatus, TaskUpdate, UserId,
};
use crate::error::{Error, Result};
use crate::storage::{DependencyStore, IdCounters, Storage, TaskStore};
use async_trait::async_trait;
use chrono::Utc;
use petgraph::Direction;
use std::collections::BTreeSet;

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn create_task(&mut self, new_task: NewTask, created_by: UserId) -> Result<Task> {
        let mut inner = self.lock().await;

        new_task.validate().map_err(Error::Validation)?;

        let id = inner.next_task_id();
        let now = Utc::now();
        let task = Task {
            id,
            title: new_task.title,
            description: new_task.description,
            status: new_task.status.unwrap_or(TaskStatus::Pending),
            due_date: new_task.due_date,
            assigned_to: new_task.assigned_to,
            created_by,
            created_at: now,
            updated_at: now,
        };

        inner.insert_task(task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        let inner = self.lock().await;
        Ok(inner.tasks.get(&id).cloned())
    }

    async fn update_task(&mut self, id: TaskId, updates: TaskUpdate) -> Result<Task> {
        let mut inner = self.lock().await;

        let current = inner.tasks.get(&id).ok_or(Error::TaskNotFound(id))?;

        // Apply to a copy so a rejected update leaves the stored task untouched
        let mut task = current.clone();
        if let Some(title) = updates.title {
            task.title = title;
        }
        if let Some(description) = updates.description {
            task.description = description;
        }
        if let Some(status) = updates.status {
            task.status = status;
        }
        if let Some(due_date) = updates.due_date {
            task.due_date = due_date;
        }
        if let Some(assigned_to) = updates.assigned_to {
            task.assigned_to = assigned_to;
        }
        task.validate().map_err(Error::Validation)?;
        task.updated_at = Utc::now();

        inner.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn delete_task(&mut self, id: TaskId) -> Result<()> {
        let mut inner = self.lock().await;

        if !inner.tasks.contains_key(&id) {
            return Err(Error::TaskNotFound(id));
        }

        let dependents: Vec<TaskId> = edges_of(&inner, id, Direction::Incoming)?
            .into_iter()
            .map(|dep| dep.task_id)
            .collect();
        if !dependents.is_empty() {
            return Err(Error::DependentsExist {
                task_id: id,
                dependents,
            });
        }

        inner.remove_task(id);
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let inner = self.lock().await;

        Ok(inner
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DependencyStore for InMemoryStore {
    async fn edge_exists(&self, task_id: TaskId, depends_on_task_id: TaskId) -> Result<bool> {
        let inner = self.lock().await;
        Ok(inner.find_edge(task_id, depends_on_task_id).is_some())
    }

    async fn create_edge(
        &mut self,
        task_id: TaskId,
        depends_on_task_id: TaskId,
    ) -> Result<Dependency> {
        let mut inner = self.lock().await;

        if task_id == depends_on_task_id {
            return Err(Error::SelfDependency(task_id));
        }
        for id in [task_id, depends_on_task_id] {
            if !inner.tasks.contains_key(&id) {
                return Err(Error::TaskNotFound(id));
            }
        }
        if inner.find_edge(task_id, depends_on_task_id).is_some() {
            return Err(Error::DuplicateDependency {
                task_id,
                depends_on_task_id,
            });
        }

        let dependency = Dependency {
            id: inner.next_dependency_id(),
            task_id,
            depends_on_task_id,
            created_at: Utc::now(),
        };
        inner.insert_edge(dependency.clone());
        Ok(dependency)
    }

    async fn get_edge(&self, id: DependencyId) -> Result<Option<Dependency>> {
        let inner = self.lock().await;
        Ok(inner
            .edge_map
            .get(&id)
            .and_then(|edge| inner.graph.edge_weight(*edge))
            .cloned())
    }

    async fn delete_edge(
        &mut self,
        task_id: TaskId,
        depends_on_task_id: TaskId,
    ) -> Result<Dependency> {
        let mut inner = self.lock().await;

        inner
            .find_edge(task_id, depends_on_task_id)
            .and_then(|edge| inner.remove_edge(edge))
            .ok_or(Error::DependencyNotFound {
                task_id,
                depends_on_task_id,
            })
    }

    async fn delete_edge_by_id(&mut self, id: DependencyId) -> Result<Option<Dependency>> {
        let mut inner = self.lock().await;

        let edge = inner.edge_map.get(&id).copied();
        Ok(edge.and_then(|edge| inner.remove_edge(edge)))
    }

    async fn delete_all_edges_for_task(&mut self, task_id: TaskId) -> Result<usize> {
        let mut inner = self.lock().await;

        let outgoing: Vec<TaskId> = edges_of(&inner, task_id, Direction::Outgoing)?
            .into_iter()
            .map(|dep| dep.depends_on_task_id)
            .collect();

        let mut removed = 0;
        for target in outgoing {
            if let Some(edge) = inner.find_edge(task_id, target) {
                if inner.remove_edge(edge).is_some() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn edges_from(&self, task_id: TaskId) -> Result<BTreeSet<TaskId>> {
        let inner = self.lock().await;
        Ok(edges_of(&inner, task_id, Direction::Outgoing)?
            .into_iter()
            .map(|dep| dep.depends_on_task_id)
            .collect())
    }

    async fn edges_to(&self, task_id: TaskId) -> Result<BTreeSet<TaskId>> {
        let inner = self.lock().await;
        Ok(edges_of(&inner, task_id, Direction::Incoming)?
            .into_iter()
            .map(|dep| dep.task_id)
            .collect())
    }

    async fn outgoing_edges(&self, task_id: TaskId) -> Result<Vec<TaskId>> {
        let inner = self.lock().await;
        Ok(edges_of(&inner, task_id, Direction::Outgoing)?
            .into_iter()
            .map(|dep| dep.depends_on_task_id)
            .collect())
    }

    async fn dependencies_of(&self, task_id: TaskId) -> Result<Vec<Dependency>> {
        let inner = self.lock().await;
        edges_of(&inner, task_id, Direction::Outgoing)
    }

    async fn dependents_of(&self, task_id: TaskId) -> Result<Vec<Dependency>> {
        let inner = self.lock().await;
        edges_of(&inner, task_id, Direction::Incoming)
    }

    async fn all_edges(&self) -> Result<Vec<Dependency>> {
        let inner = self.lock().await;
        let mut edges: Vec<Dependency> = inner.graph.edge_weights().cloned().collect();
        edges.sort_by_key(|dep| dep.id);
        Ok(edges)
    }
}

#[async_trait]
impl Storage for InMemoryStore {
    async fn save(&self) -> Result<()> {
        // No-op for pure in-memory storage
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        // Nothing on disk to restore from
        Ok(())
    }

    async fn id_counters(&self) -> Result<IdCounters> {
        Ok(self.lock().await.counters())
    }
}
