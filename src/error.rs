//! Error taxonomy for the identity and feed core.
//!
//! Validation and authentication failures are recoverable and reported as
//! structured results; storage constraint violations caused by lost races
//! re-surface as the same [`ValidationError`] the pre-check would have
//! produced. Anything else is fatal to the current operation and
//! propagated unchanged.

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Fields reported by [`ValidationError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Password,
    PasswordConfirmation,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
            Self::Password => write!(f, "password"),
            Self::PasswordConfirmation => write!(f, "password confirmation"),
        }
    }
}

/// A single violated constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Validation failure listing every violated constraint, never just the
/// first one found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, message: &str) {
        self.errors.push(FieldError {
            field,
            message: message.to_string(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed:")?;
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            write!(f, " {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Failures surfaced by the core components.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more input constraints were violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The operation addressed a user or relationship that does not exist.
    #[error("record not found")]
    NotFound,

    /// The storage collaborator failed; not retried.
    #[error(transparent)]
    Store(StoreError),

    /// An internal operation (hashing, token generation) failed.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingReference => Self::NotFound,
            other => Self::Store(other),
        }
    }
}
