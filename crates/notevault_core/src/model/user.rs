//! User domain model.
//!
//! # Responsibility
//! - Define the single user entity (identity, profile and login id).
//! - Normalize and validate registration input shape.
//!
//! # Invariants
//! - `email` is the login identifier and is globally unique in storage.
//! - `slug` is immutable once the user is persisted.
//! - Credential hashes never live on `User`; see `UserCredentials`.

use crate::model::slug::UserSlug;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum length of `first_name` / `last_name`.
pub const NAME_MAX_CHARS: usize = 30;
/// Maximum email length accepted at registration.
pub const EMAIL_MAX_CHARS: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@(localhost|([^\s@.]+\.)+[^\s@.]+)$").expect("valid email regex")
});

/// Registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub slug: UserSlug,
    /// Normalized email, also used as login id.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Identifier the user logs in with.
    pub fn login_id(&self) -> &str {
        &self.email
    }

    /// `"first last"`, trimmed when either part is empty.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// User plus stored password hash, only used by the credential check.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Normalizes an email address for storage and lookup.
///
/// Trims surrounding whitespace and lowercases the domain part, keeping the
/// local part untouched.
pub fn normalize_email(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => trimmed.to_string(),
    }
}

/// Returns a human-readable problem with a normalized email, if any.
pub fn email_problem(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        return Some("This field is required.");
    }
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Some("Ensure this field has no more than 254 characters.");
    }
    if !EMAIL_RE.is_match(email) {
        return Some("Enter a valid email address.");
    }
    None
}

/// Returns a human-readable problem with a first/last name, if any.
pub fn name_problem(name: &str) -> Option<&'static str> {
    if name.chars().count() > NAME_MAX_CHARS {
        return Some("Ensure this field has no more than 30 characters.");
    }
    None
}
