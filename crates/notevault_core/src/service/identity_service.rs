//! Identity registry use-case service.
//!
//! # Responsibility
//! - Register users: validate input, enforce email uniqueness, generate
//!   slugs and store hashed credentials.
//! - Resolve users by slug.
//! - Provide the credential comparison contract used by the auth gateway.
//!
//! # Invariants
//! - Emails are normalized (domain lowercased) before any lookup or write.
//! - A failed registration leaves no user row behind.
//! - Logs carry slugs only, never emails or passwords.

use crate::model::now_utc;
use crate::model::slug::UserSlug;
use crate::model::user::{email_problem, name_problem, normalize_email, User};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::service::credential::CredentialHasher;
use crate::service::{FieldError, ServiceError, MAX_ID_ATTEMPTS};
use log::{info, warn};

/// Registration input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Identity registry facade over a user repository.
pub struct IdentityService<R: UserRepository> {
    repo: R,
    hasher: CredentialHasher,
}

impl<R: UserRepository> IdentityService<R> {
    /// Creates a service with the default argon2 cost.
    pub fn new(repo: R) -> Self {
        Self::with_hasher(repo, CredentialHasher::default())
    }

    /// Creates a service with an explicit credential hasher.
    pub fn with_hasher(repo: R, hasher: CredentialHasher) -> Self {
        Self { repo, hasher }
    }

    /// Registers a new user.
    ///
    /// # Errors
    /// - `Validation` for malformed email, empty password or overlong names.
    /// - `DuplicateEmail` when the normalized email is already registered.
    pub fn register(&self, registration: &Registration) -> Result<User, ServiceError> {
        let email = normalize_email(&registration.email);
        let first_name = registration
            .first_name
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string();
        let last_name = registration
            .last_name
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string();

        let mut problems = Vec::new();
        if let Some(message) = email_problem(&email) {
            problems.push(FieldError::new("email", message));
        }
        if registration.password.trim().is_empty() {
            problems.push(FieldError::new("password", "This field is required."));
        }
        if let Some(message) = name_problem(&first_name) {
            problems.push(FieldError::new("first_name", message));
        }
        if let Some(message) = name_problem(&last_name) {
            problems.push(FieldError::new("last_name", message));
        }
        if !problems.is_empty() {
            return Err(ServiceError::Validation(problems));
        }

        if self.repo.email_exists(&email)? {
            info!("event=user_register module=identity_service status=rejected reason=duplicate_email");
            return Err(ServiceError::DuplicateEmail(email));
        }

        let password_hash = self.hasher.hash(&registration.password)?;
        let mut user = User {
            slug: UserSlug::generate(),
            email,
            first_name,
            last_name,
            created_at: now_utc(),
        };

        for attempt in 1..=MAX_ID_ATTEMPTS {
            match self.repo.create_user(&user, &password_hash) {
                Ok(()) => {
                    info!(
                        "event=user_register module=identity_service status=ok user={} attempt={attempt}",
                        user.slug
                    );
                    return Ok(user);
                }
                Err(RepoError::IdCollision(target)) => {
                    warn!(
                        "event=user_register module=identity_service status=retry target={target} attempt={attempt}"
                    );
                    user.slug = UserSlug::generate();
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ServiceError::InconsistentState(
            "exhausted user slug generation attempts",
        ))
    }

    /// Resolves a user by slug.
    pub fn lookup_by_slug(&self, slug: &UserSlug) -> Result<User, ServiceError> {
        self.repo
            .get_user(slug)?
            .ok_or_else(|| ServiceError::UserNotFound(slug.clone()))
    }

    /// Checks a login id (email) and password pair.
    ///
    /// Unknown login ids and wrong passwords both yield `AuthFailure`.
    pub fn verify_credentials(&self, login_id: &str, password: &str) -> Result<User, ServiceError> {
        let email = normalize_email(login_id);
        let Some(credentials) = self.repo.get_credentials(&email)? else {
            self.hasher.verify_missing(password);
            return Err(ServiceError::AuthFailure);
        };
        if !self.hasher.verify(password, &credentials.password_hash) {
            return Err(ServiceError::AuthFailure);
        }
        Ok(credentials.user)
    }
}

#[cfg(test)]
mod tests {
    use super::{IdentityService, Registration};
    use crate::db::open_db_in_memory;
    use crate::repo::user_repo::SqliteUserRepository;
    use crate::service::credential::CredentialHasher;
    use crate::service::{ErrorKind, ServiceError};

    fn fast_hasher() -> CredentialHasher {
        CredentialHasher::with_cost(64, 1, 1).unwrap()
    }

    #[test]
    fn unknown_login_id_still_runs_a_password_verification() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteUserRepository::try_new(&conn).unwrap();
        let service = IdentityService::with_hasher(repo, fast_hasher());
        assert!(!service.hasher.has_decoy());

        let err = service
            .verify_credentials("nobody@example.com", "guess")
            .unwrap_err();
        assert!(matches!(err, ServiceError::AuthFailure));
        assert!(service.hasher.has_decoy());
    }

    #[test]
    fn whitespace_only_password_is_rejected() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteUserRepository::try_new(&conn).unwrap();
        let service = IdentityService::with_hasher(repo, fast_hasher());

        let err = service
            .register(&Registration {
                email: "blank@example.com".to_string(),
                password: "   ".to_string(),
                ..Registration::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(err.field_errors()[0].field, "password");
    }
}
