//! Repository port for task and membership persistence.
//!
//! Writes happen only inside [`TaskRepository::with_transaction`]: the
//! supplied work receives a [`TaskUnitOfWork`] and every write it performs is
//! committed when it returns `Ok` and discarded otherwise.

use crate::task::domain::{MembershipRole, Task, TaskId, TaskMembership, TaskState, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Operations available inside one atomic unit of work.
///
/// Reads observe the writes already made by the same unit of work.
pub trait TaskUnitOfWork {
    /// Returns the identifiers in `ids` that belong to existing users.
    ///
    /// Each identifier appears at most once in the output; order is not
    /// significant.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the lookup fails.
    fn find_users_by_ids(&mut self, ids: &[UserId]) -> TaskRepositoryResult<Vec<UserId>>;

    /// Persists a task.
    ///
    /// The repository does not re-run domain validation; it only rejects
    /// storage constraint violations.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the identifier is
    /// already taken.
    fn insert_task(&mut self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists a membership link.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateMembership`] when the user is
    /// already linked to the task, [`TaskRepositoryError::DuplicateCreator`]
    /// when the task already has a creator, and
    /// [`TaskRepositoryError::UnknownTask`] or
    /// [`TaskRepositoryError::UnknownUser`] for dangling references.
    fn insert_membership(&mut self, membership: &TaskMembership) -> TaskRepositoryResult<()>;
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Runs `work` inside a single atomic unit of work.
    ///
    /// Returning `Ok` commits every write performed by `work`; returning
    /// `Err` rolls all of them back. Other readers never observe a partial
    /// result.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`TaskRepositoryError`]
    /// converted into `E` when the transaction itself cannot be opened or
    /// committed.
    async fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TaskUnitOfWork) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns every task in the given state, newest first.
    async fn find_by_state(&self, state: TaskState) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the memberships of a task, creator first.
    async fn memberships_for_task(&self, task_id: TaskId)
    -> TaskRepositoryResult<Vec<TaskMembership>>;

    /// Returns the tasks a user is linked to, newest first.
    ///
    /// With `role` set only links carrying that role are considered.
    async fn tasks_for_user(
        &self,
        user_id: UserId,
        role: Option<MembershipRole>,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Deletes a task together with all of its memberships.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The user already holds a membership on the task.
    #[error("user {user_id} is already linked to task {task_id}")]
    DuplicateMembership {
        /// Task the membership points at.
        task_id: TaskId,
        /// User already linked to the task.
        user_id: UserId,
    },

    /// The task already has a creator membership.
    #[error("task {0} already has a creator")]
    DuplicateCreator(TaskId),

    /// A membership references a task that does not exist.
    #[error("task not found for membership: {0}")]
    UnknownTask(TaskId),

    /// A membership references a user that does not exist.
    #[error("user not found for membership: {0}")]
    UnknownUser(UserId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
