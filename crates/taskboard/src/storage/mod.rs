//! Storage abstraction layer for taskboard.
//!
//! This module provides the storage traits and a factory for creating
//! storage backends:
//!
//! - **In-memory**: Fast, ephemeral storage backed by a map of tasks and a
//!   petgraph adjacency index for dependency edges
//! - **JSONL**: The in-memory backend persisted to a JSON Lines file
//!
//! # Architecture
//!
//! Storage is split along the two record kinds it holds:
//!
//! - [`TaskStore`] persists task records
//! - [`DependencyStore`] persists directed edges between existing tasks
//!
//! [`Storage`] combines both with the persistence hooks `save` and `reload`.
//! All traits are async and object-safe so services can hold a
//! `Box<dyn Storage>` regardless of the backend.
//!
//! # Concurrency
//!
//! Backends guard their own data, but they do not serialize multi-step
//! operations (check, then insert). Services share storage as a
//! [`SharedStorage`] and take its write guard for the full duration of any
//! mutation.
//!
//! # Example
//!
//! ```no_run
//! use taskboard::domain::{NewTask, UserId};
//! use taskboard::storage::{create_storage, StorageBackend};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> taskboard::Result<()> {
//!     let mut storage = create_storage(StorageBackend::InMemory).await?;
//!
//!     let report = storage.create_task(NewTask::titled("Write report"), UserId(1)).await?;
//!     let review = storage.create_task(NewTask::titled("Review report"), UserId(1)).await?;
//!     storage.create_edge(review.id, report.id).await?;
//!
//!     assert!(storage.edge_exists(review.id, report.id).await?);
//!     Ok(())
//! }
//! ```

use crate::domain::{
    Dependency, DependencyId, NewTask, Task, TaskFilter, TaskId, TaskUpdate, UserId,
};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

// Storage backend implementations
pub mod in_memory;

/// Storage shared between services.
///
/// The `RwLock` is the serialization point for mutations: writers hold the
/// write guard across every check and write of one operation, readers share
/// the read guard.
pub type SharedStorage = Arc<RwLock<Box<dyn Storage>>>;

/// Wrap a storage backend for sharing between services.
pub fn share(storage: Box<dyn Storage>) -> SharedStorage {
    Arc::new(RwLock::new(storage))
}

/// High-water marks of a store's id sequences.
///
/// Every id at or below these values has been handed out, possibly to a
/// record deleted since, and is never assigned again by the same store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    /// Highest task id assigned so far
    pub last_task_id: u64,

    /// Highest dependency id assigned so far
    pub last_dependency_id: u64,
}

/// Persistence of task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a new task.
    ///
    /// Assigns the next task id and sets creation timestamps. The status
    /// defaults to pending.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the task data is invalid.
    async fn create_task(&mut self, task: NewTask, created_by: UserId) -> Result<Task>;

    /// Get a task by ID.
    ///
    /// Returns `None` if the task doesn't exist.
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>>;

    /// Update an existing task.
    ///
    /// Only fields present in `updates` are modified. Returns the updated task.
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if the task doesn't exist
    /// - `Error::Validation` if the updated task is invalid
    async fn update_task(&mut self, id: TaskId, updates: TaskUpdate) -> Result<Task>;

    /// Delete a task.
    ///
    /// Removes the task and all its outgoing dependency edges. Fails if other
    /// tasks depend on this one.
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if the task doesn't exist
    /// - `Error::DependentsExist` if other tasks depend on this task
    async fn delete_task(&mut self, id: TaskId) -> Result<()>;

    /// List tasks matching the filter, in ascending id order.
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;
}

/// Persistence of dependency edges.
///
/// Edges are directed from the dependent task to the task it depends on.
/// Stores enforce existence, self-loop and duplicate rules; acyclicity is the
/// caller's responsibility (see [`crate::cycle`]).
#[async_trait]
pub trait DependencyStore: Send + Sync {
    /// Whether the edge `task_id -> depends_on_task_id` exists.
    async fn edge_exists(&self, task_id: TaskId, depends_on_task_id: TaskId) -> Result<bool>;

    /// Create the edge `task_id -> depends_on_task_id`.
    ///
    /// # Errors
    ///
    /// - `Error::SelfDependency` if both ids are equal
    /// - `Error::TaskNotFound` if either task doesn't exist
    /// - `Error::DuplicateDependency` if the edge already exists
    async fn create_edge(&mut self, task_id: TaskId, depends_on_task_id: TaskId)
    -> Result<Dependency>;

    /// Get an edge by its surrogate id.
    async fn get_edge(&self, id: DependencyId) -> Result<Option<Dependency>>;

    /// Delete the edge `task_id -> depends_on_task_id`, returning it.
    ///
    /// # Errors
    ///
    /// - `Error::DependencyNotFound` if the edge doesn't exist
    async fn delete_edge(&mut self, task_id: TaskId, depends_on_task_id: TaskId)
    -> Result<Dependency>;

    /// Delete an edge by its surrogate id, returning it.
    ///
    /// Returns `None` if no edge has this id.
    async fn delete_edge_by_id(&mut self, id: DependencyId) -> Result<Option<Dependency>>;

    /// Delete every edge where `task_id` is the dependent side.
    ///
    /// Returns the number of edges removed.
    async fn delete_all_edges_for_task(&mut self, task_id: TaskId) -> Result<usize>;

    /// Direct dependencies of a task (edge targets).
    async fn edges_from(&self, task_id: TaskId) -> Result<BTreeSet<TaskId>>;

    /// Direct dependents of a task (edge sources).
    async fn edges_to(&self, task_id: TaskId) -> Result<BTreeSet<TaskId>>;

    /// Edge targets of a task in ascending id order.
    ///
    /// Used for graph traversal; the order only makes traversal deterministic.
    async fn outgoing_edges(&self, task_id: TaskId) -> Result<Vec<TaskId>>;

    /// Edge records leaving a task, in ascending order of target id.
    async fn dependencies_of(&self, task_id: TaskId) -> Result<Vec<Dependency>>;

    /// Edge records entering a task, in ascending order of source id.
    async fn dependents_of(&self, task_id: TaskId) -> Result<Vec<Dependency>>;

    /// Every edge in the store, in ascending id order.
    async fn all_edges(&self) -> Result<Vec<Dependency>>;
}

/// Complete storage backend: tasks, edges and persistence.
#[async_trait]
pub trait Storage: TaskStore + DependencyStore {
    /// Save changes to persistent storage.
    ///
    /// For in-memory storage this is a no-op. For JSONL backing, this writes
    /// the whole state to disk atomically.
    async fn save(&self) -> Result<()>;

    /// Reload state from persistent storage, discarding in-memory changes.
    ///
    /// Restores the state of the last successful `save()`. Services call this
    /// after a failed save so in-memory state never runs ahead of disk.
    ///
    /// - **JSONL backend**: Re-reads the file; an absent file means empty storage
    /// - **In-memory only**: No-op
    async fn reload(&mut self) -> Result<()>;

    /// Id high-water marks, persisted alongside the data so deleted ids stay
    /// retired across reloads.
    async fn id_counters(&self) -> Result<IdCounters>;
}

/// Storage backend configuration.
///
/// Determines which storage implementation to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL file storage (persistent)
    Jsonl(PathBuf),
}

impl StorageBackend {
    /// Returns the data file path for file-based backends.
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StorageBackend::Jsonl(path) => Some(path),
            StorageBackend::InMemory => None,
        }
    }
}

/// Wrapper that adds JSONL file persistence to the in-memory backend.
///
/// All reads and writes go to the in-memory store; `save()` writes every task
/// and edge to the JSONL file atomically and `reload()` rebuilds the
/// in-memory store from it.
struct JsonlBackedStorage {
    inner: Box<dyn Storage>,
    path: PathBuf,
}

#[async_trait]
impl TaskStore for JsonlBackedStorage {
    async fn create_task(&mut self, task: NewTask, created_by: UserId) -> Result<Task> {
        self.inner.create_task(task, created_by).await
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.inner.get_task(id).await
    }

    async fn update_task(&mut self, id: TaskId, updates: TaskUpdate) -> Result<Task> {
        self.inner.update_task(id, updates).await
    }

    async fn delete_task(&mut self, id: TaskId) -> Result<()> {
        self.inner.delete_task(id).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.inner.list_tasks(filter).await
    }
}

#[async_trait]
impl DependencyStore for JsonlBackedStorage {
    async fn edge_exists(&self, task_id: TaskId, depends_on_task_id: TaskId) -> Result<bool> {
        self.inner.edge_exists(task_id, depends_on_task_id).await
    }

    async fn create_edge(
        &mut self,
        task_id: TaskId,
        depends_on_task_id: TaskId,
    ) -> Result<Dependency> {
        self.inner.create_edge(task_id, depends_on_task_id).await
    }

    async fn get_edge(&self, id: DependencyId) -> Result<Option<Dependency>> {
        self.inner.get_edge(id).await
    }

    async fn delete_edge(
        &mut self,
        task_id: TaskId,
        depends_on_task_id: TaskId,
    ) -> Result<Dependency> {
        self.inner.delete_edge(task_id, depends_on_task_id).await
    }

    async fn delete_edge_by_id(&mut self, id: DependencyId) -> Result<Option<Dependency>> {
        self.inner.delete_edge_by_id(id).await
    }

    async fn delete_all_edges_for_task(&mut self, task_id: TaskId) -> Result<usize> {
        self.inner.delete_all_edges_for_task(task_id).await
    }

    async fn edges_from(&self, task_id: TaskId) -> Result<BTreeSet<TaskId>> {
        self.inner.edges_from(task_id).await
    }

    async fn edges_to(&self, task_id: TaskId) -> Result<BTreeSet<TaskId>> {
        self.inner.edges_to(task_id).await
    }

    async fn outgoing_edges(&self, task_id: TaskId) -> Result<Vec<TaskId>> {
        self.inner.outgoing_edges(task_id).await
    }

    async fn dependencies_of(&self, task_id: TaskId) -> Result<Vec<Dependency>> {
        self.inner.dependencies_of(task_id).await
    }

    async fn dependents_of(&self, task_id: TaskId) -> Result<Vec<Dependency>> {
        self.inner.dependents_of(task_id).await
    }

    async fn all_edges(&self) -> Result<Vec<Dependency>> {
        self.inner.all_edges().await
    }
}

#[async_trait]
impl Storage for JsonlBackedStorage {
    async fn save(&self) -> Result<()> {
        in_memory::save_to_jsonl(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&mut self) -> Result<()> {
        self.inner = open_jsonl(&self.path).await?;
        Ok(())
    }

    async fn id_counters(&self) -> Result<IdCounters> {
        self.inner.id_counters().await
    }
}

/// Load the in-memory store from `path`, or start empty if the file is absent.
async fn open_jsonl(path: &Path) -> Result<Box<dyn Storage>> {
    if !tokio::fs::try_exists(path).await? {
        // First run - nothing saved yet
        return Ok(in_memory::new_in_memory_storage());
    }

    let (store, warnings) = in_memory::load_from_jsonl(path).await?;
    for warning in &warnings {
        // Log warnings but continue - storage is still usable
        tracing::warn!(warning = ?warning, path = %path.display(), "JSONL load warning");
    }
    Ok(store)
}

/// Create a storage instance for the given backend.
///
/// # Errors
///
/// - `Error::Io` if the data directory cannot be created or the JSONL file
///   exists but cannot be read
pub async fn create_storage(backend: StorageBackend) -> Result<Box<dyn Storage>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_storage()),
        StorageBackend::Jsonl(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let inner = open_jsonl(&path).await?;
            Ok(Box::new(JsonlBackedStorage { inner, path }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_trait_object_usage() {
        let mut storage: Box<dyn Storage> = create_storage(StorageBackend::InMemory).await.unwrap();

        let task = storage
            .create_task(NewTask::titled("Test"), UserId(1))
            .await
            .unwrap();
        assert_eq!(task.id, TaskId(1));
        assert!(storage.get_task(task.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_jsonl_reload_restores_disk_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.jsonl");

        let mut storage = create_storage(StorageBackend::Jsonl(path.clone()))
            .await
            .unwrap();

        let a = storage
            .create_task(NewTask::titled("A"), UserId(1))
            .await
            .unwrap();
        let b = storage
            .create_task(NewTask::titled("B"), UserId(1))
            .await
            .unwrap();
        storage.save().await.unwrap();

        // Modify in memory without saving
        storage.create_edge(a.id, b.id).await.unwrap();
        assert!(storage.edge_exists(a.id, b.id).await.unwrap());

        storage.reload().await.unwrap();

        assert!(!storage.edge_exists(a.id, b.id).await.unwrap());
        assert!(storage.get_task(b.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_jsonl_reload_missing_file_resets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.jsonl");

        let mut storage = create_storage(StorageBackend::Jsonl(path))
            .await
            .unwrap();
        let task = storage
            .create_task(NewTask::titled("Unsaved"), UserId(1))
            .await
            .unwrap();

        storage.reload().await.unwrap();

        assert!(storage.get_task(task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_reload_is_noop() {
        let mut storage = create_storage(StorageBackend::InMemory).await.unwrap();
        let task = storage
            .create_task(NewTask::titled("Kept"), UserId(1))
            .await
            .unwrap();

        storage.reload().await.unwrap();

        assert!(storage.get_task(task.id).await.unwrap().is_some());
    }

    #[test]
    fn test_backend_data_path() {
        assert_eq!(StorageBackend::InMemory.data_path(), None);
        let backend = StorageBackend::Jsonl(PathBuf::from("tasks.jsonl"));
        assert_eq!(backend.data_path(), Some(Path::new("tasks.jsonl")));
    }
}
