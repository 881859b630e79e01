//! In-memory user repository for tests and embedded use.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::identity::{
    domain::{EmailAddress, Handle, User, UserId},
    ports::{UserRepository, UserRepositoryError, UserRepositoryResult},
};

/// Thread-safe in-memory user repository.
///
/// Clones share the same underlying store, which lets the in-memory task
/// adapter resolve user identifiers against it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the subset of `ids` that belong to stored users.
    pub(crate) fn known_ids(&self, ids: &[UserId]) -> UserRepositoryResult<Vec<UserId>> {
        let users = self.read()?;
        let mut seen = HashSet::with_capacity(ids.len());
        Ok(ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id) && users.contains_key(id))
            .collect())
    }

    /// Returns whether a user with the given identifier is stored.
    pub(crate) fn contains(&self, id: UserId) -> UserRepositoryResult<bool> {
        Ok(self.read()?.contains_key(&id))
    }

    fn read(&self) -> UserRepositoryResult<RwLockReadGuard<'_, HashMap<UserId, User>>> {
        self.users.read().map_err(|err| {
            UserRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> UserRepositoryResult<RwLockWriteGuard<'_, HashMap<UserId, User>>> {
        self.users.write().map_err(|err| {
            UserRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn store(&self, user: &User) -> UserRepositoryResult<()> {
        let mut users = self.write()?;
        if users.contains_key(&user.id()) {
            return Err(UserRepositoryError::DuplicateUser(user.id()));
        }
        if users.values().any(|existing| existing.email() == user.email()) {
            return Err(UserRepositoryError::DuplicateEmail(user.email().clone()));
        }
        if users.values().any(|existing| existing.handle() == user.handle()) {
            return Err(UserRepositoryError::DuplicateHandle(user.handle().clone()));
        }

        users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> UserRepositoryResult<Option<User>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> UserRepositoryResult<Vec<User>> {
        let users = self.read()?;
        let mut seen = HashSet::with_capacity(ids.len());
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| users.get(id).cloned())
            .collect())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> UserRepositoryResult<Option<User>> {
        let users = self.read()?;
        Ok(users.values().find(|user| user.email() == email).cloned())
    }

    async fn find_by_handle(&self, handle: &Handle) -> UserRepositoryResult<Option<User>> {
        let users = self.read()?;
        Ok(users.values().find(|user| user.handle() == handle).cloned())
    }
}
