//! Server configuration.
//!
//! Loaded from a YAML file with kebab-case keys:
//!
//! ```yaml
//! listen-addr: "127.0.0.1:8080"
//! storage:
//!   backend: jsonl
//!   data-file: .taskboard/tasks.jsonl
//! users:
//!   - id: 1
//!     name: Morgan
//!     email: morgan@example.com
//!     role: manager
//!     token: manager-token
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use taskboard::domain::{Role, User, UserId};
use taskboard::error::{Error, Result};
use taskboard::storage::StorageBackend;
use taskboard::users::UserDirectory;
use tokio::fs;

/// Default data file for the JSONL backend
pub const DEFAULT_DATA_FILE: &str = ".taskboard/tasks.jsonl";

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Listen address (e.g., "127.0.0.1:8080").
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Known users and their bearer tokens.
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            storage: StorageConfig::default(),
            users: Vec::new(),
        }
    }
}

/// Storage backend kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Ephemeral in-memory storage
    #[default]
    Memory,

    /// In-memory storage persisted to a JSONL file
    Jsonl,
}

/// Storage configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Storage backend type.
    #[serde(default)]
    pub backend: BackendKind,

    /// Path to the data file, used by the JSONL backend.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            data_file: default_data_file(),
        }
    }
}

impl StorageConfig {
    /// The storage backend this section describes.
    pub fn to_backend(&self) -> StorageBackend {
        match self.backend {
            BackendKind::Memory => StorageBackend::InMemory,
            BackendKind::Jsonl => StorageBackend::Jsonl(self.data_file.clone()),
        }
    }
}

/// A user entry in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// User id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Role
    pub role: Role,
    /// Bearer token that authenticates this user
    pub token: String,
}

impl ServerConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// it is not valid YAML or fails validation.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the listen address and the user list.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unparsable address, duplicate user ids
    /// or tokens, and empty tokens.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        self.user_directory()?;
        Ok(())
    }

    /// The parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen-addr '{}': {}", self.listen_addr, e)))
    }

    /// Build the user directory from the configured users.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for duplicate user ids or tokens and empty
    /// tokens.
    pub fn user_directory(&self) -> Result<UserDirectory> {
        let mut directory = UserDirectory::new();
        for entry in &self.users {
            let user = User {
                id: entry.id,
                name: entry.name.clone(),
                email: entry.email.clone(),
                role: entry.role,
            };
            directory.insert(user, entry.token.clone())?;
        }
        Ok(directory)
    }
}
