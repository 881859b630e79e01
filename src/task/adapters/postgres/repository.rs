//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{MembershipRow, TaskRow},
    schema::{task_memberships, tasks},
};
use crate::database::PgPool;
use crate::identity::adapters::postgres::schema::users;
use crate::task::{
    domain::{
        MembershipRole, PersistedMembershipData, PersistedTaskData, Task, TaskId, TaskMembership,
        TaskState, UserId,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskUnitOfWork},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use tracing::debug;

const MEMBERSHIP_PRIMARY_KEY: &str = "task_memberships_pkey";
const SINGLE_CREATOR_INDEX: &str = "idx_task_memberships_single_creator";
const MEMBERSHIP_TASK_FOREIGN_KEY: &str = "task_memberships_task_id_fkey";
const MEMBERSHIP_USER_FOREIGN_KEY: &str = "task_memberships_user_id_fkey";

/// `PostgreSQL`-backed task repository.
///
/// A unit of work is a Diesel transaction on one pooled connection, run on
/// Tokio's blocking pool from start to commit.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

/// Failure inside a Diesel transaction: either the caller's work asked for a
/// rollback or the database itself failed.
enum TransactionError<E> {
    Work(E),
    Database(DieselError),
}

impl<E> From<DieselError> for TransactionError<E> {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

struct PostgresUnitOfWork<'a> {
    connection: &'a mut PgConnection,
}

impl TaskUnitOfWork for PostgresUnitOfWork<'_> {
    fn find_users_by_ids(&mut self, ids: &[UserId]) -> TaskRepositoryResult<Vec<UserId>> {
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        let found = users::table
            .filter(users::id.eq_any(uuids))
            .select(users::id)
            .load::<uuid::Uuid>(&mut *self.connection)
            .map_err(TaskRepositoryError::persistence)?;
        Ok(found.into_iter().map(UserId::from_uuid).collect())
    }

    fn insert_task(&mut self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        diesel::insert_into(tasks::table)
            .values(&to_task_row(task))
            .execute(&mut *self.connection)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    TaskRepositoryError::DuplicateTask(task_id)
                }
                _ => TaskRepositoryError::persistence(err),
            })?;
        Ok(())
    }

    fn insert_membership(&mut self, membership: &TaskMembership) -> TaskRepositoryResult<()> {
        diesel::insert_into(task_memberships::table)
            .values(&to_membership_row(membership))
            .execute(&mut *self.connection)
            .map_err(|err| membership_insert_error(err, membership))?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TaskUnitOfWork) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<TaskRepositoryError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut pooled = pool
                .get()
                .map_err(|err| E::from(TaskRepositoryError::persistence(err)))?;
            let connection: &mut PgConnection = &mut pooled;
            connection
                .transaction::<T, TransactionError<E>, _>(|tx| {
                    let mut unit = PostgresUnitOfWork { connection: tx };
                    work(&mut unit).map_err(TransactionError::Work)
                })
                .map_err(|err| match err {
                    TransactionError::Work(work_err) => {
                        debug!("rolled back task unit of work");
                        work_err
                    }
                    TransactionError::Database(db_err) => {
                        E::from(TaskRepositoryError::persistence(db_err))
                    }
                })
        })
        .await
        .map_err(|err| E::from(TaskRepositoryError::persistence(err)))?
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_by_state(&self, state: TaskState) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::state.eq(state.as_str()))
                .order((tasks::created_at.desc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn memberships_for_task(
        &self,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Vec<TaskMembership>> {
        self.run_blocking(move |connection| {
            // 'creator' sorts after 'assignee', so descending role puts the
            // creator link first.
            let rows = task_memberships::table
                .filter(task_memberships::task_id.eq(task_id.into_inner()))
                .order((
                    task_memberships::role.desc(),
                    task_memberships::created_at.asc(),
                    task_memberships::user_id.asc(),
                ))
                .select(MembershipRow::as_select())
                .load::<MembershipRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_membership).collect()
        })
        .await
    }

    async fn tasks_for_user(
        &self,
        user_id: UserId,
        role: Option<MembershipRole>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let mut query = tasks::table
                .inner_join(task_memberships::table)
                .filter(task_memberships::user_id.eq(user_id.into_inner()))
                .order((tasks::created_at.desc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .into_boxed();
            if let Some(wanted) = role {
                query = query.filter(task_memberships::role.eq(wanted.as_str()));
            }

            let rows = query
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(tasks::table.filter(tasks::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn membership_insert_error(err: DieselError, membership: &TaskMembership) -> TaskRepositoryError {
    let task_id = membership.task_id();
    let user_id = membership.user_id();
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if violates(info.as_ref(), SINGLE_CREATOR_INDEX) =>
        {
            TaskRepositoryError::DuplicateCreator(task_id)
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if violates(info.as_ref(), MEMBERSHIP_PRIMARY_KEY) =>
        {
            TaskRepositoryError::DuplicateMembership { task_id, user_id }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info)
            if violates(info.as_ref(), MEMBERSHIP_TASK_FOREIGN_KEY) =>
        {
            TaskRepositoryError::UnknownTask(task_id)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info)
            if violates(info.as_ref(), MEMBERSHIP_USER_FOREIGN_KEY) =>
        {
            TaskRepositoryError::UnknownUser(user_id)
        }
        _ => TaskRepositoryError::persistence(err),
    }
}

fn violates(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}

fn to_task_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().map(ToOwned::to_owned),
        state: task.state().as_str().to_owned(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn to_membership_row(membership: &TaskMembership) -> MembershipRow {
    MembershipRow {
        task_id: membership.task_id().into_inner(),
        user_id: membership.user_id().into_inner(),
        role: membership.role().as_str().to_owned(),
        created_at: membership.created_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        state: persisted_state,
        created_at,
        updated_at,
    } = row;

    let state =
        TaskState::try_from(persisted_state.as_str()).map_err(TaskRepositoryError::persistence)?;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        title,
        description,
        state,
        created_at,
        updated_at,
    };
    Ok(Task::from_persisted(data))
}

fn row_to_membership(row: MembershipRow) -> TaskRepositoryResult<TaskMembership> {
    let role = MembershipRole::try_from(row.role.as_str())
        .map_err(TaskRepositoryError::persistence)?;
    Ok(TaskMembership::from_persisted(PersistedMembershipData {
        task_id: TaskId::from_uuid(row.task_id),
        user_id: UserId::from_uuid(row.user_id),
        role,
        created_at: row.created_at,
    }))
}
