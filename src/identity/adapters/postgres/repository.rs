//! `PostgreSQL` repository implementation for the identity store.

use super::{
    models::{NewUserRow, UserRow},
    schema::users,
};
use crate::database::PgPool;
use crate::identity::{
    domain::{
        CredentialDigest, EmailAddress, Handle, PersistedUserData, User, UserId,
    },
    ports::{UserRepository, UserRepositoryError, UserRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

const EMAIL_UNIQUE_CONSTRAINT: &str = "idx_users_email_unique";
const HANDLE_UNIQUE_CONSTRAINT: &str = "idx_users_handle_unique";

/// `PostgreSQL`-backed user repository.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> UserRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> UserRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(UserRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(UserRepositoryError::persistence)?
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn store(&self, user: &User) -> UserRepositoryResult<()> {
        let user_id = user.id();
        let email = user.email().clone();
        let handle = user.handle().clone();
        let new_row = to_new_row(user);

        self.run_blocking(move |connection| {
            diesel::insert_into(users::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                        match constraint_name(info.as_ref()) {
                            Some(EMAIL_UNIQUE_CONSTRAINT) => {
                                UserRepositoryError::DuplicateEmail(email.clone())
                            }
                            Some(HANDLE_UNIQUE_CONSTRAINT) => {
                                UserRepositoryError::DuplicateHandle(handle.clone())
                            }
                            _ => UserRepositoryError::DuplicateUser(user_id),
                        }
                    }
                    _ => UserRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> UserRepositoryResult<Option<User>> {
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::id.eq(id.into_inner()))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(UserRepositoryError::persistence)?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> UserRepositoryResult<Vec<User>> {
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        self.run_blocking(move |connection| {
            let rows = users::table
                .filter(users::id.eq_any(uuids))
                .select(UserRow::as_select())
                .load::<UserRow>(connection)
                .map_err(UserRepositoryError::persistence)?;
            rows.into_iter().map(row_to_user).collect()
        })
        .await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> UserRepositoryResult<Option<User>> {
        let lookup = email.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::email.eq(lookup))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(UserRepositoryError::persistence)?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn find_by_handle(&self, handle: &Handle) -> UserRepositoryResult<Option<User>> {
        let lookup = handle.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::handle.eq(lookup))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(UserRepositoryError::persistence)?;
            row.map(row_to_user).transpose()
        })
        .await
    }
}

fn to_new_row(user: &User) -> NewUserRow {
    NewUserRow {
        id: user.id().into_inner(),
        email: user.email().as_str().to_owned(),
        handle: user.handle().as_str().to_owned(),
        credential_digest: user.credential_digest().as_str().to_owned(),
        created_at: user.created_at(),
        updated_at: user.updated_at(),
    }
}

fn row_to_user(row: UserRow) -> UserRepositoryResult<User> {
    let UserRow {
        id,
        email,
        handle,
        credential_digest,
        created_at,
        updated_at,
    } = row;

    let data = PersistedUserData {
        id: UserId::from_uuid(id),
        email: EmailAddress::new(email).map_err(UserRepositoryError::persistence)?,
        handle: Handle::new(handle).map_err(UserRepositoryError::persistence)?,
        credential_digest: CredentialDigest::new(credential_digest)
            .map_err(UserRepositoryError::persistence)?,
        created_at,
        updated_at,
    };
    Ok(User::from_persisted(data))
}

fn constraint_name(info: &dyn DatabaseErrorInformation) -> Option<&str> {
    info.constraint_name()
}
