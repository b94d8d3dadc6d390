//! Directory of known users and their bearer tokens.
//!
//! Users are provisioned up front (from configuration); the directory only
//! resolves tokens to users and answers membership questions.

use crate::domain::{User, UserId};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Known users, indexed by id and by token.
#[derive(Debug, Default, Clone)]
pub struct UserDirectory {
    users: BTreeMap<UserId, User>,
    tokens: HashMap<String, UserId>,
}

impl UserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user with its bearer token.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the token is empty, or if the id or the
    /// token is already registered.
    pub fn insert(&mut self, user: User, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::Config(format!("user {} has an empty token", user.id)));
        }
        if self.users.contains_key(&user.id) {
            return Err(Error::Config(format!("duplicate user id {}", user.id)));
        }
        if self.tokens.contains_key(&token) {
            return Err(Error::Config(format!(
                "user {} reuses a token already assigned to another user",
                user.id
            )));
        }

        self.tokens.insert(token, user.id);
        self.users.insert(user.id, user);
        Ok(())
    }

    /// Resolve a bearer token to its user.
    pub fn authenticate(&self, token: &str) -> Option<&User> {
        self.tokens.get(token).and_then(|id| self.users.get(id))
    }

    /// Look up a user by id.
    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Whether a user with this id exists.
    pub fn contains(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory has no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
