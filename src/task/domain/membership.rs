//! Role-tagged links between users and tasks.

use super::{ParseMembershipRoleError, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a user holds on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    /// The user who created the task. Exactly one per task.
    Creator,
    /// A collaborator assigned to the task.
    Assignee,
}

impl MembershipRole {
    /// Every role.
    pub const ALL: [Self; 2] = [Self::Creator, Self::Assignee];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Assignee => "assignee",
        }
    }
}

impl TryFrom<&str> for MembershipRole {
    type Error = ParseMembershipRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "creator" => Ok(Self::Creator),
            "assignee" => Ok(Self::Assignee),
            _ => Err(ParseMembershipRoleError(value.to_owned())),
        }
    }
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link between a user and a task.
///
/// Memberships are never mutated in place; changing a role means deleting
/// the link and creating a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMembership {
    task_id: TaskId,
    user_id: UserId,
    role: MembershipRole,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMembershipData {
    /// Linked task.
    pub task_id: TaskId,
    /// Linked user.
    pub user_id: UserId,
    /// Persisted role.
    pub role: MembershipRole,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskMembership {
    /// Creates a membership stamped with the current clock time.
    #[must_use]
    pub fn new(task_id: TaskId, user_id: UserId, role: MembershipRole, clock: &impl Clock) -> Self {
        Self {
            task_id,
            user_id,
            role,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a membership from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedMembershipData) -> Self {
        Self {
            task_id: data.task_id,
            user_id: data.user_id,
            role: data.role,
            created_at: data.created_at,
        }
    }

    /// Returns the linked task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the linked user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the role.
    #[must_use]
    pub const fn role(&self) -> MembershipRole {
        self.role
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` for the creator link.
    #[must_use]
    pub const fn is_creator(&self) -> bool {
        matches!(self.role, MembershipRole::Creator)
    }
}
