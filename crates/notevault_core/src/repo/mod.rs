//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`UserNotFound`, `NoteNotFound`,
//!   `DuplicateEmail`, `IdCollision`) in addition to DB transport errors.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Multi-statement writes run inside `BEGIN IMMEDIATE` transactions.

use crate::db::DbError;
use crate::model::from_millis;
use crate::model::slug::{NoteSlug, UserSlug};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note_repo;
pub mod revision_repo;
pub mod share_repo;
pub mod token_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    UserNotFound(UserSlug),
    NoteNotFound(NoteSlug),
    /// Another user already registered this (normalized) email.
    DuplicateEmail(String),
    /// A generated identifier hit a unique constraint (`table.column`).
    IdCollision(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UserNotFound(slug) => write!(f, "user not found: {slug}"),
            Self::NoteNotFound(slug) => write!(f, "note not found: {slug}"),
            Self::DuplicateEmail(_) => write!(f, "email already registered"),
            Self::IdCollision(target) => write!(f, "generated identifier collided on {target}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Returns `table.column` when `err` is a UNIQUE/PRIMARY KEY violation.
pub(crate) fn unique_violation_target(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(inner, Some(message))
            if inner.code == ErrorCode::ConstraintViolation =>
        {
            message.strip_prefix("UNIQUE constraint failed: ")
        }
        _ => None,
    }
}

pub(crate) fn parse_user_slug(value: &str, column: &str) -> RepoResult<UserSlug> {
    UserSlug::parse(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid user slug `{value}` in {column}")))
}

pub(crate) fn parse_note_slug(value: &str, column: &str) -> RepoResult<NoteSlug> {
    NoteSlug::parse(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid note slug `{value}` in {column}")))
}

pub(crate) fn parse_timestamp(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    from_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

pub(crate) fn user_exists(conn: &Connection, slug: &UserSlug) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE slug = ?1);",
        [slug.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for &table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
