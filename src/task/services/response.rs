//! Presentation envelope for task creation outcomes.

use super::{CreatedTask, TaskCreationError};
use crate::task::domain::Task;
use serde::{Deserialize, Serialize};

/// HTTP status used for a committed task.
pub const STATUS_CREATED: u16 = 201;

/// HTTP status used for a rejected task.
pub const STATUS_UNPROCESSABLE: u16 = 422;

/// Serializable outcome of a task creation.
///
/// Serializes as `{"status":"success","task":{...}}` or
/// `{"status":"error","errors":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreateTaskResponse {
    /// The task was committed.
    Success {
        /// The persisted task.
        task: Task,
    },
    /// The task was rejected and nothing was persisted.
    Error {
        /// Human-readable reasons, in order.
        errors: Vec<String>,
    },
}

impl CreateTaskResponse {
    /// Returns the HTTP status code matching the outcome.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Success { .. } => STATUS_CREATED,
            Self::Error { .. } => STATUS_UNPROCESSABLE,
        }
    }

    /// Returns `true` when the task was committed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<Result<CreatedTask, TaskCreationError>> for CreateTaskResponse {
    fn from(outcome: Result<CreatedTask, TaskCreationError>) -> Self {
        match outcome {
            Ok(created) => Self::Success {
                task: created.into_task(),
            },
            Err(err) => Self::Error {
                errors: err.messages(),
            },
        }
    }
}
