//! Share grant repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create a grant and its recipient set as one transactional unit.
//! - Resolve each requested recipient independently.
//! - List the grants of a note.
//!
//! # Invariants
//! - Unknown note or sharer aborts the whole grant; nothing is written.
//! - Unresolvable recipients are reported as skipped, never as errors.
//! - Readers never observe a grant without its final recipient set.

use crate::model::share::{RecipientOutcome, ShareGrant, ShareOutcome, SkipReason};
use crate::model::slug::{NoteSlug, UserSlug};
use crate::repo::{
    ensure_tables, parse_note_slug, parse_timestamp, parse_user_slug, user_exists, RepoError,
    RepoResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

/// Repository interface for the sharing registry.
pub trait ShareRepository {
    /// Creates one grant for `note_slug` by `sharer` with the recipients that
    /// resolve, and reports the outcome of every requested entry.
    fn create_grant(
        &mut self,
        note_slug: &NoteSlug,
        sharer: &UserSlug,
        requested_recipients: &[String],
        at: DateTime<Utc>,
    ) -> RepoResult<ShareOutcome>;
    /// Lists grants of a note in creation order, or `None` for unknown notes.
    fn grants_for_note(&self, note_slug: &NoteSlug) -> RepoResult<Option<Vec<ShareGrant>>>;
}

/// SQLite-backed share repository.
pub struct SqliteShareRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteShareRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "notes", "shared_notes", "shared_note_recipients"])?;
        Ok(Self { conn })
    }
}

impl ShareRepository for SqliteShareRepository<'_> {
    fn create_grant(
        &mut self,
        note_slug: &NoteSlug,
        sharer: &UserSlug,
        requested_recipients: &[String],
        at: DateTime<Utc>,
    ) -> RepoResult<ShareOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let note_id = note_id_for_slug(&tx, note_slug)?
            .ok_or_else(|| RepoError::NoteNotFound(note_slug.clone()))?;
        if !user_exists(&tx, sharer)? {
            return Err(RepoError::UserNotFound(sharer.clone()));
        }

        tx.execute(
            "INSERT INTO shared_notes (note_id, shared_by, shared_at) VALUES (?1, ?2, ?3);",
            params![note_id, sharer.as_str(), at.timestamp_millis()],
        )?;
        let grant_id = tx.last_insert_rowid();

        let mut shared_with = Vec::new();
        let mut recipients = Vec::with_capacity(requested_recipients.len());
        for requested in requested_recipients {
            let slug = match UserSlug::parse(requested) {
                Ok(slug) => slug,
                Err(err) => {
                    recipients.push(RecipientOutcome::Skipped {
                        requested: requested.clone(),
                        reason: err.into(),
                    });
                    continue;
                }
            };

            if !user_exists(&tx, &slug)? {
                recipients.push(RecipientOutcome::Skipped {
                    requested: requested.clone(),
                    reason: SkipReason::UnknownUser,
                });
                continue;
            }

            let added = tx.execute(
                "INSERT OR IGNORE INTO shared_note_recipients (shared_note_id, user_slug)
                 VALUES (?1, ?2);",
                params![grant_id, slug.as_str()],
            )?;
            if added == 1 {
                shared_with.push(slug.clone());
                recipients.push(RecipientOutcome::Granted { slug });
            } else {
                recipients.push(RecipientOutcome::Duplicate { slug });
            }
        }

        tx.commit()?;

        Ok(ShareOutcome {
            grant: ShareGrant {
                id: grant_id,
                note_slug: note_slug.clone(),
                shared_by: sharer.clone(),
                shared_with,
                shared_at: at,
            },
            recipients,
        })
    }

    fn grants_for_note(&self, note_slug: &NoteSlug) -> RepoResult<Option<Vec<ShareGrant>>> {
        let Some(note_id) = note_id_for_slug(self.conn, note_slug)? else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT
                s.id,
                n.slug AS note_slug,
                s.shared_by,
                s.shared_at
             FROM shared_notes s
             INNER JOIN notes n ON n.id = s.note_id
             WHERE s.note_id = ?1
             ORDER BY s.id ASC;",
        )?;
        let mut rows = stmt.query([note_id])?;
        let mut grants = Vec::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get("id")?;
            let slug_text: String = row.get("note_slug")?;
            let shared_by: String = row.get("shared_by")?;
            let shared_at: i64 = row.get("shared_at")?;
            grants.push(ShareGrant {
                id,
                note_slug: parse_note_slug(&slug_text, "notes.slug")?,
                shared_by: parse_user_slug(&shared_by, "shared_notes.shared_by")?,
                shared_with: load_recipients(self.conn, id)?,
                shared_at: parse_timestamp(shared_at, "shared_notes.shared_at")?,
            });
        }

        Ok(Some(grants))
    }
}

fn note_id_for_slug(conn: &Connection, note_slug: &NoteSlug) -> RepoResult<Option<i64>> {
    let note_id = conn
        .query_row(
            "SELECT id FROM notes WHERE slug = ?1;",
            [note_slug.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(note_id)
}

fn load_recipients(conn: &Connection, grant_id: i64) -> RepoResult<Vec<UserSlug>> {
    let mut stmt = conn.prepare(
        "SELECT user_slug
         FROM shared_note_recipients
         WHERE shared_note_id = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([grant_id])?;
    let mut recipients = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        recipients.push(parse_user_slug(
            &value,
            "shared_note_recipients.user_slug",
        )?);
    }
    Ok(recipients)
}
