//! Read-side lookups over persisted tasks.

use crate::task::{
    domain::{MembershipRole, Task, TaskId, TaskMembership, TaskState, UserId},
    ports::{TaskRepository, TaskRepositoryResult},
};
use std::sync::Arc;

/// Task lookup service.
#[derive(Clone)]
pub struct TaskQueryService<R>
where
    R: TaskRepository,
{
    repository: Arc<R>,
}

impl<R> TaskQueryService<R>
where
    R: TaskRepository,
{
    /// Creates a new task query service.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Retrieves a task by identifier.
    ///
    /// Returns `Ok(None)` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::task::ports::TaskRepositoryError`] when the lookup
    /// fails.
    pub async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.repository.find_by_id(id).await
    }

    /// Lists tasks in the given state, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::task::ports::TaskRepositoryError`] when the lookup
    /// fails.
    pub async fn find_by_state(&self, state: TaskState) -> TaskRepositoryResult<Vec<Task>> {
        self.repository.find_by_state(state).await
    }

    /// Lists the tasks a user created, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::task::ports::TaskRepositoryError`] when the lookup
    /// fails.
    pub async fn created_by(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.repository
            .tasks_for_user(user_id, Some(MembershipRole::Creator))
            .await
    }

    /// Lists the tasks a user is assigned to, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::task::ports::TaskRepositoryError`] when the lookup
    /// fails.
    pub async fn assigned_to(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.repository
            .tasks_for_user(user_id, Some(MembershipRole::Assignee))
            .await
    }

    /// Lists every task a user is linked to in any role, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::task::ports::TaskRepositoryError`] when the lookup
    /// fails.
    pub async fn linked_to(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.repository.tasks_for_user(user_id, None).await
    }

    /// Lists a task's memberships, creator first.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::task::ports::TaskRepositoryError`] when the lookup
    /// fails.
    pub async fn memberships(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<TaskMembership>> {
        self.repository.memberships_for_task(task_id).await
    }
}
