//! Session/auth gateway use-case service.
//!
//! # Responsibility
//! - Exchange login credentials for a bearer token.
//! - Resolve bearer tokens into the acting user.
//! - Revoke tokens on logout.
//!
//! # Invariants
//! - One token per user; repeated logins return the same token until logout.
//! - Failures never tell the caller which credential was wrong.
//! - Token values are never logged.

use crate::model::now_utc;
use crate::model::slug::UserSlug;
use crate::model::token::generate_token_value;
use crate::model::user::User;
use crate::repo::token_repo::TokenRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::service::identity_service::IdentityService;
use crate::service::{FieldError, ServiceError, MAX_ID_ATTEMPTS};
use log::{info, warn};
use serde::Serialize;

/// Successful login result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginSession {
    pub user_slug: UserSlug,
    /// `"first last"` display name.
    pub user_name: String,
    pub token: String,
}

/// Result of a logout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutStatus {
    LoggedOut,
    AlreadyLoggedOut,
}

/// Auth gateway over the identity registry and a token store.
pub struct AuthService<U: UserRepository, T: TokenRepository> {
    identity: IdentityService<U>,
    tokens: T,
}

impl<U: UserRepository, T: TokenRepository> AuthService<U, T> {
    pub fn new(identity: IdentityService<U>, tokens: T) -> Self {
        Self { identity, tokens }
    }

    /// Verifies credentials and returns the user's bearer token.
    ///
    /// # Errors
    /// - `Validation` when either field is blank.
    /// - `AuthFailure` for unknown login ids or wrong passwords.
    pub fn login(&self, login_id: &str, password: &str) -> Result<LoginSession, ServiceError> {
        let mut problems = Vec::new();
        if login_id.trim().is_empty() {
            problems.push(FieldError::new(
                "username",
                "Both username and password are required",
            ));
        }
        if password.trim().is_empty() {
            problems.push(FieldError::new(
                "password",
                "Both username and password are required",
            ));
        }
        if !problems.is_empty() {
            return Err(ServiceError::Validation(problems));
        }

        let user = match self.identity.verify_credentials(login_id, password) {
            Ok(user) => user,
            Err(err) => {
                info!("event=auth_login module=auth_service status=rejected kind={}", err.kind().as_str());
                return Err(err);
            }
        };

        for attempt in 1..=MAX_ID_ATTEMPTS {
            match self
                .tokens
                .get_or_create_token(&user.slug, &generate_token_value(), now_utc())
            {
                Ok(token) => {
                    info!(
                        "event=auth_login module=auth_service status=ok user={}",
                        user.slug
                    );
                    return Ok(LoginSession {
                        user_name: user.display_name(),
                        user_slug: user.slug,
                        token: token.token,
                    });
                }
                Err(RepoError::IdCollision(target)) => {
                    warn!(
                        "event=auth_login module=auth_service status=retry target={target} attempt={attempt}"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ServiceError::InconsistentState(
            "exhausted token generation attempts",
        ))
    }

    /// Resolves a bearer token into the acting user.
    pub fn authenticate(&self, token: &str) -> Result<User, ServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::AuthFailure);
        }
        self.tokens
            .find_user_by_token(token)?
            .ok_or(ServiceError::AuthFailure)
    }

    /// Revokes a bearer token.
    pub fn logout(&self, token: &str) -> Result<LogoutStatus, ServiceError> {
        if self.tokens.delete_token(token.trim())? {
            info!("event=auth_logout module=auth_service status=ok");
            Ok(LogoutStatus::LoggedOut)
        } else {
            Ok(LogoutStatus::AlreadyLoggedOut)
        }
    }
}
