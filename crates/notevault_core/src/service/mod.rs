//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Validate caller input shape and map storage outcomes onto the shared
//!   `ServiceError` taxonomy.
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - Every failure is reported as a structured `ServiceError` with a stable
//!   `ErrorKind`; nothing is retried except identifier regeneration.

use crate::model::slug::{NoteSlug, SlugError, UserSlug};
use crate::repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod auth_service;
pub mod credential;
pub mod identity_service;
pub mod note_service;
pub mod revision_service;
pub mod share_service;

/// Attempts made when a generated slug or token collides with an existing one.
pub(crate) const MAX_ID_ATTEMPTS: usize = 5;

/// Stable classification of service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DuplicateEmail,
    UnknownUser,
    NotFound,
    AuthFailure,
    ValidationFailure,
    Internal,
}

impl ErrorKind {
    /// Machine-readable code, e.g. `not_found`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateEmail => "duplicate_email",
            Self::UnknownUser => "unknown_user",
            Self::NotFound => "not_found",
            Self::AuthFailure => "auth_failure",
            Self::ValidationFailure => "validation_failure",
            Self::Internal => "internal",
        }
    }
}

/// One invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Error returned by every core use-case.
#[derive(Debug)]
pub enum ServiceError {
    /// Registration with an email that is already taken.
    DuplicateEmail(String),
    /// Acting/owning user slug does not resolve.
    UnknownUser(UserSlug),
    /// Looked-up user does not exist.
    UserNotFound(UserSlug),
    /// Looked-up note does not exist.
    NoteNotFound(NoteSlug),
    /// Bad credentials or token; deliberately carries no detail.
    AuthFailure,
    /// Malformed input, with per-field detail.
    Validation(Vec<FieldError>),
    /// Password hashing backend failure.
    Credential(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateEmail(_) => ErrorKind::DuplicateEmail,
            Self::UnknownUser(_) => ErrorKind::UnknownUser,
            Self::UserNotFound(_) | Self::NoteNotFound(_) => ErrorKind::NotFound,
            Self::AuthFailure => ErrorKind::AuthFailure,
            Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::Credential(_) | Self::Repo(_) | Self::InconsistentState(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Per-field detail for validation failures; empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(fields) => fields.as_slice(),
            _ => &[],
        }
    }

    pub(crate) fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail(_) => write!(f, "Email must be unique"),
            Self::UnknownUser(slug) => write!(f, "User does not exist: {slug}"),
            Self::UserNotFound(slug) => write!(f, "user not found: {slug}"),
            Self::NoteNotFound(slug) => write!(f, "note not found: {slug}"),
            Self::AuthFailure => write!(f, "Unable to login with provided credentials"),
            Self::Validation(fields) => {
                write!(f, "invalid input:")?;
                for field in fields {
                    write!(f, " {}: {};", field.field, field.message)?;
                }
                Ok(())
            }
            Self::Credential(message) => write!(f, "credential backend failure: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserNotFound(slug) => Self::UserNotFound(slug),
            RepoError::NoteNotFound(slug) => Self::NoteNotFound(slug),
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            other => Self::Repo(other),
        }
    }
}

/// Parses a user slug supplied for `field`, reporting a validation failure.
pub fn parse_user_slug_field(field: &'static str, raw: &str) -> Result<UserSlug, ServiceError> {
    UserSlug::parse(raw).map_err(|err| slug_field_error(field, err))
}

/// Parses a note slug supplied for `field`, reporting a validation failure.
pub fn parse_note_slug_field(field: &'static str, raw: &str) -> Result<NoteSlug, ServiceError> {
    NoteSlug::parse(raw).map_err(|err| slug_field_error(field, err))
}

fn slug_field_error(field: &'static str, err: SlugError) -> ServiceError {
    match err {
        SlugError::Empty => ServiceError::invalid_field(field, "This field is required."),
        other => ServiceError::invalid_field(field, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_note_slug_field, parse_user_slug_field, ErrorKind, ServiceError};
    use crate::model::slug::{NoteSlug, UserSlug};
    use crate::repo::RepoError;

    #[test]
    fn repo_not_found_maps_to_not_found_kind() {
        let slug = NoteSlug::parse("abcdef123").unwrap();
        let err = ServiceError::from(RepoError::NoteNotFound(slug.clone()));
        assert!(matches!(err, ServiceError::NoteNotFound(ref found) if *found == slug));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn unknown_user_and_user_not_found_have_distinct_kinds() {
        let slug = UserSlug::parse("0123456789").unwrap();
        assert_eq!(
            ServiceError::UnknownUser(slug.clone()).kind(),
            ErrorKind::UnknownUser
        );
        assert_eq!(ServiceError::UserNotFound(slug).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn slug_field_parsing_reports_field_detail() {
        let err = parse_user_slug_field("user_slug", "  ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(err.field_errors()[0].field, "user_slug");
        assert_eq!(err.field_errors()[0].message, "This field is required.");

        let err = parse_note_slug_field("slug", "no spaces").unwrap_err();
        assert_eq!(err.field_errors()[0].field, "slug");
        assert!(parse_note_slug_field("slug", "abcdef123").is_ok());
    }

    #[test]
    fn auth_failure_message_is_generic() {
        let message = ServiceError::AuthFailure.to_string();
        assert_eq!(message, "Unable to login with provided credentials");
        assert_eq!(ErrorKind::AuthFailure.as_str(), "auth_failure");
    }
}
