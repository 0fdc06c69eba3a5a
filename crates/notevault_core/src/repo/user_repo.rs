//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist user records together with their opaque credential hash.
//! - Resolve users by slug and by login email.
//!
//! # Invariants
//! - Email uniqueness is enforced by the `users.email` unique index, so a
//!   racing duplicate registration still surfaces as `DuplicateEmail`.
//! - A slug collision surfaces as `IdCollision`, never as a duplicate email.

use crate::model::slug::UserSlug;
use crate::model::user::{User, UserCredentials};
use crate::repo::{
    ensure_tables, parse_timestamp, parse_user_slug, unique_violation_target, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    slug,
    email,
    first_name,
    last_name,
    created_at,
    password_hash
FROM users";

/// Repository interface for the identity registry.
pub trait UserRepository {
    /// Inserts one user with its password hash.
    fn create_user(&self, user: &User, password_hash: &str) -> RepoResult<()>;
    /// Gets one user by slug.
    fn get_user(&self, slug: &UserSlug) -> RepoResult<Option<User>>;
    /// Returns whether a normalized email is already registered.
    fn email_exists(&self, email: &str) -> RepoResult<bool>;
    /// Loads the user and stored hash for a login email.
    fn get_credentials(&self, email: &str) -> RepoResult<Option<UserCredentials>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User, password_hash: &str) -> RepoResult<()> {
        let inserted = self.conn.execute(
            "INSERT INTO users (
                slug,
                email,
                first_name,
                last_name,
                password_hash,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.slug.as_str(),
                user.email.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                password_hash,
                user.created_at.timestamp_millis(),
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(err) => match unique_violation_target(&err) {
                Some("users.email") => Err(RepoError::DuplicateEmail(user.email.clone())),
                Some(target) => Err(RepoError::IdCollision(target.to_string())),
                None => Err(err.into()),
            },
        }
    }

    fn get_user(&self, slug: &UserSlug) -> RepoResult<Option<User>> {
        load_user(self.conn, slug)
    }

    fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1);",
            [email],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_credentials(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([email])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        Ok(Some(UserCredentials {
            user: parse_user_row(row)?,
            password_hash: row.get("password_hash")?,
        }))
    }
}

/// Loads one user by slug on an arbitrary connection or transaction.
pub(crate) fn load_user(conn: &Connection, slug: &UserSlug) -> RepoResult<Option<User>> {
    conn.query_row(
        &format!("{USER_SELECT_SQL} WHERE slug = ?1;"),
        [slug.as_str()],
        |row| Ok(parse_user_row(row)),
    )
    .optional()?
    .transpose()
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let slug_text: String = row.get("slug")?;
    let created_at: i64 = row.get("created_at")?;
    Ok(User {
        slug: parse_user_slug(&slug_text, "users.slug")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        created_at: parse_timestamp(created_at, "users.created_at")?,
    })
}
