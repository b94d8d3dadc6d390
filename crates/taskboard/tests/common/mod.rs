//! Shared helpers for taskboard integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use taskboard::domain::{NewTask, Role, Task, TaskId, User, UserId};
use taskboard::storage::in_memory::new_in_memory_storage;
use taskboard::storage::{share, DependencyStore, SharedStorage, Storage};
use taskboard::users::UserDirectory;
use taskboard::{DependencyEngine, TaskService};

/// Id of the manager returned by [`manager`]
pub const MANAGER_ID: UserId = UserId(1);

/// Id of the regular user returned by [`worker`]
pub const WORKER_ID: UserId = UserId(2);

/// Id of a second regular user with no assigned tasks
pub const OUTSIDER_ID: UserId = UserId(3);

pub fn manager() -> User {
    User {
        id: MANAGER_ID,
        name: "Morgan Manager".to_string(),
        email: "morgan@example.com".to_string(),
        role: Role::Manager,
    }
}

pub fn worker() -> User {
    User {
        id: WORKER_ID,
        name: "Wren Worker".to_string(),
        email: "wren@example.com".to_string(),
        role: Role::User,
    }
}

pub fn outsider() -> User {
    User {
        id: OUTSIDER_ID,
        name: "Olu Outsider".to_string(),
        email: "olu@example.com".to_string(),
        role: Role::User,
    }
}

pub fn directory() -> Arc<UserDirectory> {
    let mut users = UserDirectory::new();
    users.insert(manager(), "manager-token").expect("manager");
    users.insert(worker(), "worker-token").expect("worker");
    users.insert(outsider(), "outsider-token").expect("outsider");
    Arc::new(users)
}

/// Services wired to one shared store, as the server wires them.
pub struct Board {
    pub storage: SharedStorage,
    pub engine: DependencyEngine,
    pub tasks: TaskService,
}

impl Board {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        let storage = share(storage);
        Self {
            engine: DependencyEngine::new(storage.clone()),
            tasks: TaskService::new(storage.clone(), directory()),
            storage,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(new_in_memory_storage())
    }

    /// Create a task as the manager.
    pub async fn task(&self, title: &str) -> Task {
        self.tasks
            .create_task(&manager(), NewTask::titled(title))
            .await
            .expect("create task")
    }

    /// Create `count` tasks and return their ids.
    pub async fn task_ids(&self, count: usize) -> Vec<TaskId> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            ids.push(self.task(&format!("Task {i}")).await.id);
        }
        ids
    }

    /// Number of edges in the store.
    pub async fn edge_count(&self) -> usize {
        self.storage
            .read()
            .await
            .all_edges()
            .await
            .expect("all edges")
            .len()
    }
}
