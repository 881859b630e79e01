//! Shared test helpers for in-memory task integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::DefaultClock;
use rstest::fixture;
use taskmate::identity::{
    adapters::memory::InMemoryUserRepository,
    domain::{NewUser, User, UserId},
    ports::UserRepository,
};
use taskmate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{
        MembershipRole, PersistedTaskData, Task, TaskId, TaskMembership, TaskState,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskUnitOfWork},
    services::{TaskCreationService, TaskQueryService},
};

/// Creation service backed by the in-memory repository.
pub type MemoryCreationService = TaskCreationService<InMemoryTaskRepository, DefaultClock>;

/// Services and storage shared by one test.
pub struct MemoryContext {
    pub repository: Arc<InMemoryTaskRepository>,
    pub service: MemoryCreationService,
    pub queries: TaskQueryService<InMemoryTaskRepository>,
}

/// Provides fresh in-memory storage and services for each test.
#[fixture]
pub fn context() -> MemoryContext {
    let repository = Arc::new(InMemoryTaskRepository::new());
    MemoryContext {
        service: TaskCreationService::new(Arc::clone(&repository), Arc::new(DefaultClock)),
        queries: TaskQueryService::new(Arc::clone(&repository)),
        repository,
    }
}

/// Registers a user with a derived email address.
///
/// # Errors
///
/// Returns an error if the user is invalid or cannot be stored.
pub async fn register_user(
    users: &InMemoryUserRepository,
    handle: &str,
) -> Result<UserId, eyre::Report> {
    let user = User::register(
        NewUser::new(format!("{handle}@example.com"), handle, "digest"),
        &DefaultClock,
    )
    .map_err(|err| eyre::eyre!("register {handle}: {err}"))?;
    users
        .store(&user)
        .await
        .map_err(|err| eyre::eyre!("store {handle}: {err}"))?;
    Ok(user.id())
}

/// Counts every stored task across all states.
///
/// # Errors
///
/// Returns an error if any lookup fails.
pub async fn stored_task_count(repository: &impl TaskRepository) -> Result<usize, eyre::Report> {
    let mut total = 0;
    for state in TaskState::ALL {
        total += repository
            .find_by_state(state)
            .await
            .map_err(|err| eyre::eyre!("find_by_state({state}): {err}"))?
            .len();
    }
    Ok(total)
}

/// Builds a task with a fixed creation time `offset_minutes` after a base
/// instant.
///
/// # Errors
///
/// Returns an error if the timestamp is out of range.
pub fn task_created_at(title: &str, offset_minutes: i64) -> Result<Task, eyre::Report> {
    let at = DateTime::<Utc>::from_timestamp(1_767_258_000 + offset_minutes * 60, 0)
        .ok_or_else(|| eyre::eyre!("timestamp out of range"))?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        title: title.to_owned(),
        description: None,
        state: TaskState::Todo,
        created_at: at,
        updated_at: at,
    }))
}

/// Commits a prepared task together with its creator link.
///
/// # Errors
///
/// Returns an error if the unit of work is rejected.
pub async fn commit_task(
    repository: &InMemoryTaskRepository,
    task: Task,
    creator: UserId,
) -> Result<(), eyre::Report> {
    repository
        .with_transaction(move |unit| {
            unit.insert_task(&task)?;
            unit.insert_membership(&TaskMembership::new(
                task.id(),
                creator,
                MembershipRole::Creator,
                &DefaultClock,
            ))
        })
        .await
        .map_err(|err| eyre::eyre!("commit task: {err}"))
}

/// Task repository that fails the n-th assignee membership write of every
/// unit of work.
///
/// Everything else is delegated to the wrapped in-memory repository, so a
/// failure exercises its real rollback path.
#[derive(Debug, Clone)]
pub struct FaultyTaskRepository {
    inner: InMemoryTaskRepository,
    fail_on_assignee: usize,
}

impl FaultyTaskRepository {
    /// Wraps `inner`, failing the assignee write at zero-based position
    /// `fail_on_assignee`.
    #[must_use]
    pub const fn new(inner: InMemoryTaskRepository, fail_on_assignee: usize) -> Self {
        Self {
            inner,
            fail_on_assignee,
        }
    }

    /// Returns the wrapped repository.
    #[must_use]
    pub const fn inner(&self) -> &InMemoryTaskRepository {
        &self.inner
    }
}

struct FaultyUnitOfWork<'a> {
    inner: &'a mut dyn TaskUnitOfWork,
    fail_on_assignee: usize,
    assignees_written: usize,
}

impl TaskUnitOfWork for FaultyUnitOfWork<'_> {
    fn find_users_by_ids(&mut self, ids: &[UserId]) -> TaskRepositoryResult<Vec<UserId>> {
        self.inner.find_users_by_ids(ids)
    }

    fn insert_task(&mut self, task: &Task) -> TaskRepositoryResult<()> {
        self.inner.insert_task(task)
    }

    fn insert_membership(&mut self, membership: &TaskMembership) -> TaskRepositoryResult<()> {
        if membership.role() == MembershipRole::Assignee {
            if self.assignees_written == self.fail_on_assignee {
                return Err(TaskRepositoryError::persistence(std::io::Error::other(
                    "injected assignee write failure",
                )));
            }
            self.assignees_written += 1;
        }
        self.inner.insert_membership(membership)
    }
}

#[async_trait]
impl TaskRepository for FaultyTaskRepository {
    async fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TaskUnitOfWork) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static,
    {
        let fail_on_assignee = self.fail_on_assignee;
        self.inner
            .with_transaction(move |unit| {
                let mut faulty = FaultyUnitOfWork {
                    inner: unit,
                    fail_on_assignee,
                    assignees_written: 0,
                };
                work(&mut faulty)
            })
            .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_state(&self, state: TaskState) -> TaskRepositoryResult<Vec<Task>> {
        self.inner.find_by_state(state).await
    }

    async fn memberships_for_task(
        &self,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Vec<TaskMembership>> {
        self.inner.memberships_for_task(task_id).await
    }

    async fn tasks_for_user(
        &self,
        user_id: UserId,
        role: Option<MembershipRole>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.inner.tasks_for_user(user_id, role).await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.inner.delete(id).await
    }
}
