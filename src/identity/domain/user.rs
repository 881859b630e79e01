//! User aggregate and validated identity scalars.

use super::{IdentityDomainError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters accepted in the local part of an address, besides ASCII
/// alphanumerics.
const LOCAL_PART_SYMBOLS: &str = ".!#$%&'*+/=?^_`{|}~-";

/// Longest DNS label accepted in the domain part of an address.
const MAX_DOMAIN_LABEL_LEN: usize = 63;

/// Lower-cased email address.
///
/// Two addresses differing only in letter case are the same address, so the
/// value is normalised on construction and compared verbatim afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated, lower-cased email address.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::BlankEmail`] for empty input and
    /// [`IdentityDomainError::InvalidEmail`] when the value is not a
    /// `local@domain` address.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityDomainError::BlankEmail);
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(IdentityDomainError::InvalidEmail(raw));
        };
        if !is_valid_local_part(local) || !is_valid_domain(domain) {
            return Err(IdentityDomainError::InvalidEmail(raw));
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Returns the address as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_local_part(local: &str) -> bool {
    !local.is_empty()
        && local
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || LOCAL_PART_SYMBOLS.contains(ch))
}

fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty() && domain.split('.').all(is_valid_domain_label)
}

fn is_valid_domain_label(label: &str) -> bool {
    let within_bounds = !label.is_empty() && label.len() <= MAX_DOMAIN_LABEL_LEN;
    within_bounds
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public handle chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Creates a validated handle.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::BlankHandle`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityDomainError::BlankHandle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the handle as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque credential digest produced by the authentication layer.
///
/// The identity store never sees plain-text credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialDigest(String);

impl CredentialDigest {
    /// Wraps a non-empty credential digest.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::BlankCredential`] for empty input.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let digest = value.into();
        if digest.trim().is_empty() {
            return Err(IdentityDomainError::BlankCredential);
        }
        Ok(Self(digest))
    }

    /// Returns the digest as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialDigest(<redacted>)")
    }
}

/// Registration input for a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    email: String,
    handle: String,
    credential_digest: String,
}

impl NewUser {
    /// Creates registration input from raw values.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        handle: impl Into<String>,
        credential_digest: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            handle: handle.into(),
            credential_digest: credential_digest.into(),
        }
    }
}

/// User aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    email: EmailAddress,
    handle: Handle,
    credential_digest: CredentialDigest,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUserData {
    /// Persisted user identifier.
    pub id: UserId,
    /// Persisted, already normalised email address.
    pub email: EmailAddress,
    /// Persisted handle.
    pub handle: Handle,
    /// Persisted credential digest.
    pub credential_digest: CredentialDigest,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Validates registration input and creates a new user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError`] when the email, handle, or credential
    /// digest is invalid.
    pub fn register(input: NewUser, clock: &impl Clock) -> Result<Self, IdentityDomainError> {
        let email = EmailAddress::new(input.email)?;
        let handle = Handle::new(input.handle)?;
        let credential_digest = CredentialDigest::new(input.credential_digest)?;
        let timestamp = clock.utc();

        Ok(Self {
            id: UserId::new(),
            email,
            handle,
            credential_digest,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a user from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUserData) -> Self {
        Self {
            id: data.id,
            email: data.email,
            handle: data.handle,
            credential_digest: data.credential_digest,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the normalised email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the handle.
    #[must_use]
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns the credential digest.
    #[must_use]
    pub const fn credential_digest(&self) -> &CredentialDigest {
        &self.credential_digest
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
