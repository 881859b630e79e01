//! In-memory task repository for tests and embedded use.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::identity::adapters::memory::InMemoryUserRepository;
use crate::task::{
    domain::{MembershipRole, Task, TaskId, TaskMembership, TaskState, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskUnitOfWork},
};

/// Thread-safe in-memory task repository.
///
/// A unit of work runs against a staged copy of the store while holding the
/// write lock; the copy replaces the live state only when the work succeeds.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
    users: InMemoryUserRepository,
}

#[derive(Debug, Clone, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    memberships: Vec<TaskMembership>,
}

impl InMemoryTaskRepository {
    /// Creates an empty repository with its own empty user store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty repository resolving users against `users`.
    #[must_use]
    pub fn with_users(users: InMemoryUserRepository) -> Self {
        Self {
            state: Arc::default(),
            users,
        }
    }

    /// Returns the user store memberships are validated against.
    #[must_use]
    pub const fn users(&self) -> &InMemoryUserRepository {
        &self.users
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Unit of work writing into a private copy of the store.
struct StagedUnitOfWork<'a> {
    staged: InMemoryTaskState,
    users: &'a InMemoryUserRepository,
}

impl TaskUnitOfWork for StagedUnitOfWork<'_> {
    fn find_users_by_ids(&mut self, ids: &[UserId]) -> TaskRepositoryResult<Vec<UserId>> {
        self.users
            .known_ids(ids)
            .map_err(TaskRepositoryError::persistence)
    }

    fn insert_task(&mut self, task: &Task) -> TaskRepositoryResult<()> {
        if self.staged.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        self.staged.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    fn insert_membership(&mut self, membership: &TaskMembership) -> TaskRepositoryResult<()> {
        let task_id = membership.task_id();
        let user_id = membership.user_id();

        if !self.staged.tasks.contains_key(&task_id) {
            return Err(TaskRepositoryError::UnknownTask(task_id));
        }
        let user_exists = self
            .users
            .contains(user_id)
            .map_err(TaskRepositoryError::persistence)?;
        if !user_exists {
            return Err(TaskRepositoryError::UnknownUser(user_id));
        }

        let links = self
            .staged
            .memberships
            .iter()
            .filter(|existing| existing.task_id() == task_id);
        for existing in links {
            if existing.user_id() == user_id {
                return Err(TaskRepositoryError::DuplicateMembership { task_id, user_id });
            }
            if existing.is_creator() && membership.is_creator() {
                return Err(TaskRepositoryError::DuplicateCreator(task_id));
            }
        }

        self.staged.memberships.push(membership.clone());
        Ok(())
    }
}

/// Orders tasks newest first, breaking timestamp ties by identifier.
fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| (Reverse(task.created_at()), task.id()));
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TaskUnitOfWork) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static,
    {
        let mut state = self.write()?;
        let mut unit = StagedUnitOfWork {
            staged: state.clone(),
            users: &self.users,
        };

        match work(&mut unit) {
            Ok(value) => {
                *state = unit.staged;
                Ok(value)
            }
            Err(err) => {
                debug!("discarding staged in-memory unit of work");
                Err(err)
            }
        }
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_by_state(&self, state: TaskState) -> TaskRepositoryResult<Vec<Task>> {
        let guard = self.read()?;
        let mut tasks: Vec<Task> = guard
            .tasks
            .values()
            .filter(|task| task.state() == state)
            .cloned()
            .collect();
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    async fn memberships_for_task(
        &self,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Vec<TaskMembership>> {
        let guard = self.read()?;
        let mut memberships: Vec<TaskMembership> = guard
            .memberships
            .iter()
            .filter(|membership| membership.task_id() == task_id)
            .cloned()
            .collect();
        memberships.sort_by_key(|membership| !membership.is_creator());
        Ok(memberships)
    }

    async fn tasks_for_user(
        &self,
        user_id: UserId,
        role: Option<MembershipRole>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let guard = self.read()?;
        let mut tasks: Vec<Task> = guard
            .memberships
            .iter()
            .filter(|membership| membership.user_id() == user_id)
            .filter(|membership| role.is_none_or(|wanted| membership.role() == wanted))
            .filter_map(|membership| guard.tasks.get(&membership.task_id()).cloned())
            .collect();
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut guard = self.write()?;
        if guard.tasks.remove(&id).is_none() {
            return Err(TaskRepositoryError::NotFound(id));
        }
        guard
            .memberships
            .retain(|membership| membership.task_id() != id);
        Ok(())
    }
}
