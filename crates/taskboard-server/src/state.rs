//! Application state shared across request handlers.

use crate::config::ServerConfig;
use std::sync::Arc;
use taskboard::storage::{create_storage, share, Storage};
use taskboard::users::UserDirectory;
use taskboard::{DependencyEngine, TaskService};
use tracing::info;

/// Application state shared across request handlers.
///
/// Both services hold the same shared storage, so task lifecycle changes and
/// dependency mutations serialize on one lock.
pub struct AppState {
    /// Known users, for bearer token resolution.
    pub users: Arc<UserDirectory>,
    /// Task lifecycle operations.
    pub tasks: TaskService,
    /// Dependency graph operations.
    pub dependencies: DependencyEngine,
}

impl AppState {
    /// Build the state from configuration, opening the configured storage.
    ///
    /// # Errors
    ///
    /// Fails if the user list is invalid or the storage cannot be opened.
    pub async fn new(config: &ServerConfig) -> taskboard::Result<Self> {
        let backend = config.storage.to_backend();
        if let Some(path) = backend.data_path() {
            info!(path = %path.display(), "Using JSONL storage");
        } else {
            info!("Using in-memory storage; data is lost on shutdown");
        }
        let storage = create_storage(backend).await?;
        Self::with_storage(config, storage)
    }

    /// Build the state over an already opened storage backend.
    ///
    /// # Errors
    ///
    /// Fails if the user list is invalid.
    pub fn with_storage(config: &ServerConfig, storage: Box<dyn Storage>) -> taskboard::Result<Self> {
        let users = Arc::new(config.user_directory()?);
        let storage = share(storage);

        Ok(Self {
            tasks: TaskService::new(storage.clone(), users.clone()),
            dependencies: DependencyEngine::new(storage),
            users,
        })
    }
}
