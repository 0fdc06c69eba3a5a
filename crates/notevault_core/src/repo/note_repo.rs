//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes and resolve them by slug.
//! - Own the update transaction: content write plus ledger append.
//!
//! # Invariants
//! - Note creation only succeeds when the owner exists, checked in the same
//!   statement as the insert.
//! - `update_note_content` reads the current content, writes the new one and
//!   appends exactly one ledger row inside a single `BEGIN IMMEDIATE`
//!   transaction, so concurrent edits cannot break the ledger chain.

use crate::model::note::Note;
use crate::model::slug::{NoteSlug, UserSlug};
use crate::repo::revision_repo::append_revision;
use crate::repo::{
    ensure_tables, parse_note_slug, parse_timestamp, parse_user_slug, unique_violation_target,
    user_exists, RepoError, RepoResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    slug,
    content,
    created_by,
    last_modified_by,
    created_at,
    updated_at
FROM notes";

/// Result of a committed content update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteUpdate {
    /// Note state after the update.
    pub note: Note,
    /// Ledger sequence number of the appended revision.
    pub revision_id: i64,
}

/// Repository interface for the note store.
pub trait NoteRepository {
    /// Inserts one note; fails with `UserNotFound` when the owner is unknown.
    fn create_note(&self, note: &Note) -> RepoResult<()>;
    /// Gets one note by slug.
    fn get_note(&self, slug: &NoteSlug) -> RepoResult<Option<Note>>;
    /// Replaces note content and appends the matching ledger entry atomically.
    fn update_note_content(
        &mut self,
        slug: &NoteSlug,
        content: &str,
        editor: &UserSlug,
        at: DateTime<Utc>,
    ) -> RepoResult<NoteUpdate>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "notes", "note_history"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &Note) -> RepoResult<()> {
        let inserted = self.conn.execute(
            "INSERT INTO notes (
                slug,
                content,
                created_by,
                last_modified_by,
                created_at,
                updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6
            WHERE EXISTS(SELECT 1 FROM users WHERE slug = ?3);",
            params![
                note.slug.as_str(),
                note.content.as_str(),
                note.created_by.as_str(),
                note.last_modified_by.as_str(),
                note.created_at.timestamp_millis(),
                note.updated_at.timestamp_millis(),
            ],
        );

        match inserted {
            Ok(0) => Err(RepoError::UserNotFound(note.created_by.clone())),
            Ok(_) => Ok(()),
            Err(err) => match unique_violation_target(&err) {
                Some(target) => Err(RepoError::IdCollision(target.to_string())),
                None => Err(err.into()),
            },
        }
    }

    fn get_note(&self, slug: &NoteSlug) -> RepoResult<Option<Note>> {
        load_note(self.conn, slug).map(|found| found.map(|(_, note)| note))
    }

    fn update_note_content(
        &mut self,
        slug: &NoteSlug,
        content: &str,
        editor: &UserSlug,
        at: DateTime<Utc>,
    ) -> RepoResult<NoteUpdate> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (note_id, mut note) =
            load_note(&tx, slug)?.ok_or_else(|| RepoError::NoteNotFound(slug.clone()))?;
        if !user_exists(&tx, editor)? {
            return Err(RepoError::UserNotFound(editor.clone()));
        }

        let original_content = std::mem::replace(&mut note.content, content.to_string());
        tx.execute(
            "UPDATE notes
             SET
                content = ?2,
                last_modified_by = ?3,
                updated_at = ?4
             WHERE id = ?1;",
            params![note_id, content, editor.as_str(), at.timestamp_millis()],
        )?;
        let revision_id = append_revision(
            &tx,
            note_id,
            original_content.as_str(),
            content,
            editor,
            at,
        )?;
        tx.commit()?;

        note.last_modified_by = editor.clone();
        note.updated_at = at;
        Ok(NoteUpdate { note, revision_id })
    }
}

/// Loads a note and its row id on an arbitrary connection or transaction.
pub(crate) fn load_note(conn: &Connection, slug: &NoteSlug) -> RepoResult<Option<(i64, Note)>> {
    conn.query_row(
        &format!("{NOTE_SELECT_SQL} WHERE slug = ?1;"),
        [slug.as_str()],
        |row| Ok(parse_note_row(row)),
    )
    .optional()?
    .transpose()
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<(i64, Note)> {
    let slug: String = row.get("slug")?;
    let created_by: String = row.get("created_by")?;
    let last_modified_by: String = row.get("last_modified_by")?;
    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;

    let note = Note {
        slug: parse_note_slug(&slug, "notes.slug")?,
        content: row.get("content")?,
        created_by: parse_user_slug(&created_by, "notes.created_by")?,
        last_modified_by: parse_user_slug(&last_modified_by, "notes.last_modified_by")?,
        created_at: parse_timestamp(created_at, "notes.created_at")?,
        updated_at: parse_timestamp(updated_at, "notes.updated_at")?,
    };
    Ok((row.get("id")?, note))
}
