//! Repository port for user persistence and lookup.

use crate::identity::domain::{EmailAddress, Handle, User, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for user repository operations.
pub type UserRepositoryResult<T> = Result<T, UserRepositoryError>;

/// User persistence contract.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::DuplicateUser`],
    /// [`UserRepositoryError::DuplicateEmail`], or
    /// [`UserRepositoryError::DuplicateHandle`] when a uniqueness rule would
    /// be violated.
    async fn store(&self, user: &User) -> UserRepositoryResult<()>;

    /// Finds a user by identifier.
    async fn find_by_id(&self, id: UserId) -> UserRepositoryResult<Option<User>>;

    /// Returns every stored user whose identifier is in `ids`.
    ///
    /// Unknown identifiers are skipped; callers compare counts to detect
    /// them.
    async fn find_by_ids(&self, ids: &[UserId]) -> UserRepositoryResult<Vec<User>>;

    /// Finds a user by normalised email address.
    async fn find_by_email(&self, email: &EmailAddress) -> UserRepositoryResult<Option<User>>;

    /// Finds a user by handle.
    async fn find_by_handle(&self, handle: &Handle) -> UserRepositoryResult<Option<User>>;
}

/// Errors returned by user repository implementations.
#[derive(Debug, Clone, Error)]
pub enum UserRepositoryError {
    /// A user with the same identifier already exists.
    #[error("duplicate user identifier: {0}")]
    DuplicateUser(UserId),

    /// The email address is already taken.
    #[error("Email has already been taken: {0}")]
    DuplicateEmail(EmailAddress),

    /// The handle is already taken.
    #[error("Pseudo has already been taken: {0}")]
    DuplicateHandle(Handle),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl UserRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
