//! Diesel row models for task persistence.

use super::schema::{task_memberships, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row shape shared by task queries and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle state.
    pub state: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row shape shared by membership queries and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipRow {
    /// Linked task.
    pub task_id: uuid::Uuid,
    /// Linked user.
    pub user_id: uuid::Uuid,
    /// Membership role.
    pub role: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
