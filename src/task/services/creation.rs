//! Atomic creation of a task together with its creator and assignee links.

use crate::task::{
    domain::{MembershipRole, NewTask, Task, TaskMembership, TaskValidationError, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskUnitOfWork},
};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request payload for creating a task.
///
/// Assignee identifiers are kept as raw strings, as a form or API caller
/// would submit them; they are normalised and resolved by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    creator: Option<UserId>,
    title: String,
    description: Option<String>,
    assignee_ids: Vec<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the given title and no creator.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            creator: None,
            title: title.into(),
            description: None,
            assignee_ids: Vec::new(),
        }
    }

    /// Sets the creating user.
    #[must_use]
    pub const fn with_creator(mut self, creator: UserId) -> Self {
        self.creator = Some(creator);
        self
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets raw assignee identifiers.
    #[must_use]
    pub fn with_assignee_ids<I, S>(mut self, assignee_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignee_ids = assignee_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets assignees from typed identifiers.
    #[must_use]
    pub fn with_assignees(self, assignees: impl IntoIterator<Item = UserId>) -> Self {
        self.with_assignee_ids(assignees.into_iter().map(|id| id.to_string()))
    }

    /// Returns the creating user, if set.
    #[must_use]
    pub const fn creator(&self) -> Option<UserId> {
        self.creator
    }

    /// Returns the raw assignee identifiers as submitted.
    #[must_use]
    pub fn assignee_ids(&self) -> &[String] {
        &self.assignee_ids
    }
}

/// Reasons a task creation was rejected.
///
/// Nothing is persisted when any of these is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskCreationError {
    /// No creating user was supplied.
    #[error("Creator is required")]
    MissingCreator,

    /// The task attributes failed validation.
    #[error("{}", join_messages(.0))]
    Validation(Vec<TaskValidationError>),

    /// At least one assignee identifier did not match a stored user.
    #[error("Some assignees could not be found")]
    UnresolvedAssignees,

    /// Storage failed or rejected a write.
    #[error("{0}")]
    Unexpected(String),
}

impl TaskCreationError {
    /// Returns the human-readable error messages, in order.
    ///
    /// The list is never empty.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(errors) if !errors.is_empty() => {
                errors.iter().map(ToString::to_string).collect()
            }
            _ => vec![self.to_string()],
        }
    }

    /// Returns a stable machine-readable code for the error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingCreator => "missing_creator",
            Self::Validation(_) => "validation",
            Self::UnresolvedAssignees => "unresolved_assignees",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

impl From<TaskRepositoryError> for TaskCreationError {
    fn from(err: TaskRepositoryError) -> Self {
        Self::Unexpected(err.to_string())
    }
}

fn join_messages(errors: &[TaskValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A committed task and the memberships written with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTask {
    task: Task,
    memberships: Vec<TaskMembership>,
}

impl CreatedTask {
    /// Returns the persisted task.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the memberships, creator first then assignees in request
    /// order.
    #[must_use]
    pub fn memberships(&self) -> &[TaskMembership] {
        &self.memberships
    }

    /// Returns the identifiers of the assigned users.
    #[must_use]
    pub fn assignee_ids(&self) -> Vec<UserId> {
        self.memberships
            .iter()
            .filter(|membership| membership.role() == MembershipRole::Assignee)
            .map(TaskMembership::user_id)
            .collect()
    }

    /// Consumes the result, returning the task.
    #[must_use]
    pub fn into_task(self) -> Task {
        self.task
    }
}

/// Result type for task creation.
pub type TaskCreationResult = Result<CreatedTask, TaskCreationError>;

/// Creates tasks and their memberships in a single unit of work.
#[derive(Clone)]
pub struct TaskCreationService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync + 'static,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskCreationService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new task creation service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a task owned by the request's creator and assigns the
    /// requested collaborators.
    ///
    /// Either the task, the creator link and every assignee link are
    /// committed together, or nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCreationError::MissingCreator`] without touching storage
    /// when no creator is set, [`TaskCreationError::Validation`] for invalid
    /// attributes, [`TaskCreationError::UnresolvedAssignees`] when any
    /// assignee is unknown, and [`TaskCreationError::Unexpected`] for storage
    /// failures.
    pub async fn call(&self, request: CreateTaskRequest) -> TaskCreationResult {
        let outcome = self.create(request).await;
        match &outcome {
            Ok(created) => info!(
                task_id = %created.task().id(),
                assignees = created.assignee_ids().len(),
                "task created"
            ),
            Err(err) => warn!(
                code = err.code(),
                messages = ?err.messages(),
                "task creation rejected"
            ),
        }
        outcome
    }

    async fn create(&self, request: CreateTaskRequest) -> TaskCreationResult {
        let CreateTaskRequest {
            creator: requested_creator,
            title,
            description,
            assignee_ids,
        } = request;
        let creator = requested_creator.ok_or(TaskCreationError::MissingCreator)?;

        let mut input = NewTask::new(title);
        if let Some(text) = description {
            input = input.with_description(text);
        }
        let clock = Arc::clone(&self.clock);

        self.repository
            .with_transaction(move |unit| {
                create_within(unit, &*clock, creator, input, &assignee_ids)
            })
            .await
    }
}

fn create_within<C: Clock>(
    unit: &mut dyn TaskUnitOfWork,
    clock: &C,
    creator: UserId,
    input: NewTask,
    raw_assignees: &[String],
) -> TaskCreationResult {
    let task = Task::new(input, clock).map_err(TaskCreationError::Validation)?;
    unit.insert_task(&task)?;

    let creator_link = TaskMembership::new(task.id(), creator, MembershipRole::Creator, clock);
    unit.insert_membership(&creator_link)?;

    let assignees = AssigneeSelection::from_raw(raw_assignees);
    if assignees.has_malformed {
        return Err(TaskCreationError::UnresolvedAssignees);
    }
    let resolved = unit.find_users_by_ids(&assignees.ids)?;
    if resolved.len() != assignees.ids.len() {
        return Err(TaskCreationError::UnresolvedAssignees);
    }

    let mut memberships = Vec::with_capacity(assignees.ids.len() + 1);
    memberships.push(creator_link);
    for user_id in assignees.ids {
        let link = TaskMembership::new(task.id(), user_id, MembershipRole::Assignee, clock);
        unit.insert_membership(&link)?;
        memberships.push(link);
    }

    Ok(CreatedTask { task, memberships })
}

/// Normalised assignee identifiers from a request.
#[derive(Debug, Default, PartialEq, Eq)]
struct AssigneeSelection {
    ids: Vec<UserId>,
    has_malformed: bool,
}

impl AssigneeSelection {
    /// Trims entries, drops blank ones and removes repeats while keeping the
    /// first occurrence.
    fn from_raw(raw: &[String]) -> Self {
        let mut seen = HashSet::new();
        let mut selection = Self::default();
        for entry in raw.iter().map(|value| value.trim()).filter(|value| !value.is_empty()) {
            match entry.parse::<UserId>() {
                Ok(id) if seen.insert(id) => selection.ids.push(id),
                Ok(_) => {}
                Err(_) => selection.has_malformed = true,
            }
        }
        selection
    }
}
