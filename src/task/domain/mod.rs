//! Domain model for tasks and their role-tagged memberships.
//!
//! A [`Task`] owns its [`TaskMembership`] links; users are referenced by
//! [`UserId`] only and never mutated here.

mod error;
mod ids;
mod membership;
mod task;

pub use crate::identity::domain::UserId;
pub use error::{ParseMembershipRoleError, ParseTaskStateError, TaskValidationError};
pub use ids::TaskId;
pub use membership::{MembershipRole, PersistedMembershipData, TaskMembership};
pub use task::{NewTask, PersistedTaskData, Task, TaskState};
