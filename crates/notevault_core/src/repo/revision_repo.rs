//! Revision ledger persistence.
//!
//! # Responsibility
//! - Append ledger entries inside the note update transaction.
//! - Read a note's full history in insertion order.
//!
//! # Invariants
//! - `append_revision` is crate-private; only the note repository's update
//!   path writes ledger rows.
//! - Rows are never updated (guarded by the `note_history_append_only`
//!   trigger).

use crate::model::revision::{RevisionEntry, RevisionHistory};
use crate::model::slug::{NoteSlug, UserSlug};
use crate::repo::{
    ensure_tables, parse_note_slug, parse_timestamp, parse_user_slug, RepoResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

/// Repository interface for reading the revision ledger.
pub trait RevisionRepository {
    /// Returns the note's history, or `None` when the note does not exist.
    fn history(&self, note_slug: &NoteSlug) -> RepoResult<Option<RevisionHistory>>;
}

/// SQLite-backed revision ledger reader.
pub struct SqliteRevisionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRevisionRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notes", "note_history", "users"])?;
        Ok(Self { conn })
    }
}

impl RevisionRepository for SqliteRevisionRepository<'_> {
    fn history(&self, note_slug: &NoteSlug) -> RepoResult<Option<RevisionHistory>> {
        let note_id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM notes WHERE slug = ?1;",
                [note_slug.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(note_id) = note_id else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT
                h.id,
                n.slug AS note_slug,
                h.original_content,
                h.updated_content,
                h.updated_by,
                u.email AS updated_by_email,
                h.timestamp
             FROM note_history h
             INNER JOIN notes n ON n.id = h.note_id
             INNER JOIN users u ON u.slug = h.updated_by
             WHERE h.note_id = ?1
             ORDER BY h.id ASC;",
        )?;
        let mut rows = stmt.query([note_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_revision_row(row)?);
        }

        Ok(Some(RevisionHistory::new(note_slug.clone(), entries)))
    }
}

/// Appends one ledger row on the caller's open transaction.
///
/// Returns the new ledger sequence number.
pub(crate) fn append_revision(
    tx: &Transaction<'_>,
    note_id: i64,
    original_content: &str,
    updated_content: &str,
    editor: &UserSlug,
    at: DateTime<Utc>,
) -> RepoResult<i64> {
    tx.execute(
        "INSERT INTO note_history (
            note_id,
            original_content,
            updated_content,
            updated_by,
            timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            note_id,
            original_content,
            updated_content,
            editor.as_str(),
            at.timestamp_millis(),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn parse_revision_row(row: &Row<'_>) -> RepoResult<RevisionEntry> {
    let note_slug: String = row.get("note_slug")?;
    let updated_by: String = row.get("updated_by")?;
    let timestamp: i64 = row.get("timestamp")?;
    Ok(RevisionEntry {
        id: row.get("id")?,
        note_slug: parse_note_slug(&note_slug, "notes.slug")?,
        original_content: row.get("original_content")?,
        updated_content: row.get("updated_content")?,
        updated_by: parse_user_slug(&updated_by, "note_history.updated_by")?,
        updated_by_email: row.get("updated_by_email")?,
        timestamp: parse_timestamp(timestamp, "note_history.timestamp")?,
    })
}
