//! Bearer token persistence for the session gateway.
//!
//! # Invariants
//! - At most one token per user (`auth_tokens.user_slug` is unique).
//! - Token values are unique; a collision surfaces as `IdCollision`.

use crate::model::slug::UserSlug;
use crate::model::token::AuthToken;
use crate::model::user::User;
use crate::repo::user_repo::load_user;
use crate::repo::{
    ensure_tables, parse_timestamp, parse_user_slug, unique_violation_target, RepoError,
    RepoResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for bearer tokens.
pub trait TokenRepository {
    /// Returns the user's existing token, or stores `candidate` as a new one.
    fn get_or_create_token(
        &self,
        user: &UserSlug,
        candidate: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<AuthToken>;
    /// Resolves a token value to its user.
    fn find_user_by_token(&self, token: &str) -> RepoResult<Option<User>>;
    /// Deletes a token; returns whether one was removed.
    fn delete_token(&self, token: &str) -> RepoResult<bool>;
}

/// SQLite-backed token repository.
pub struct SqliteTokenRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTokenRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "auth_tokens"])?;
        Ok(Self { conn })
    }
}

impl TokenRepository for SqliteTokenRepository<'_> {
    fn get_or_create_token(
        &self,
        user: &UserSlug,
        candidate: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<AuthToken> {
        let inserted = self.conn.execute(
            "INSERT INTO auth_tokens (token, user_slug, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_slug) DO NOTHING;",
            params![candidate, user.as_str(), at.timestamp_millis()],
        );
        if let Err(err) = inserted {
            return match unique_violation_target(&err) {
                Some(target) => Err(RepoError::IdCollision(target.to_string())),
                None => Err(err.into()),
            };
        }

        let (token, user_slug, created_at): (String, String, i64) = self
            .conn
            .query_row(
                "SELECT token, user_slug, created_at FROM auth_tokens WHERE user_slug = ?1;",
                [user.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or_else(|| RepoError::UserNotFound(user.clone()))?;

        Ok(AuthToken {
            token,
            user_slug: parse_user_slug(&user_slug, "auth_tokens.user_slug")?,
            created_at: parse_timestamp(created_at, "auth_tokens.created_at")?,
        })
    }

    fn find_user_by_token(&self, token: &str) -> RepoResult<Option<User>> {
        let user_slug: Option<String> = self
            .conn
            .query_row(
                "SELECT user_slug FROM auth_tokens WHERE token = ?1;",
                [token],
                |row| row.get(0),
            )
            .optional()?;
        match user_slug {
            Some(value) => load_user(
                self.conn,
                &parse_user_slug(&value, "auth_tokens.user_slug")?,
            ),
            None => Ok(None),
        }
    }

    fn delete_token(&self, token: &str) -> RepoResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM auth_tokens WHERE token = ?1;", [token])?;
        Ok(deleted > 0)
    }
}
