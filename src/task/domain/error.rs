//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Field-level failures found while validating a new task.
///
/// The display strings are the messages surfaced to callers and are kept
/// stable for existing consumers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskValidationError {
    /// The title is missing or whitespace only.
    #[error("Title can't be blank")]
    BlankTitle,
}

/// Error returned while parsing task states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("State is not included in the list: {0}")]
pub struct ParseTaskStateError(pub String);

/// Error returned while parsing membership roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Role is not included in the list: {0}")]
pub struct ParseMembershipRoleError(pub String);
