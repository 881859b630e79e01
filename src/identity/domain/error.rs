//! Error types for identity validation.

use thiserror::Error;

/// Errors returned while constructing user values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityDomainError {
    /// The email address is empty after trimming.
    #[error("Email can't be blank")]
    BlankEmail,

    /// The email address does not look like `local@domain.tld`.
    #[error("Email is invalid: {0}")]
    InvalidEmail(String),

    /// The handle is empty after trimming.
    #[error("Pseudo can't be blank")]
    BlankHandle,

    /// The credential digest is empty.
    #[error("Password can't be blank")]
    BlankCredential,

    /// The user identifier could not be parsed.
    #[error("invalid user identifier: {0}")]
    InvalidUserId(String),
}
