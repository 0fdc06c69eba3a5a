//! Note store use-case service.
//!
//! # Responsibility
//! - Provide note create/get/update APIs.
//! - Treat "write content + append ledger entry" as one explicit step of
//!   the update use-case.
//!
//! # Invariants
//! - `update_note` uses full content replacement semantics and always
//!   appends one revision, even when the content is unchanged.
//! - No note-level authorization: any existing user may edit any note.
//! - Logs carry slugs and sizes only, never note content.

use crate::model::note::{is_blank_content, Note};
use crate::model::now_utc;
use crate::model::slug::{NoteSlug, UserSlug};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoError;
use crate::service::{ServiceError, MAX_ID_ATTEMPTS};
use log::{info, warn};
use std::time::Instant;

/// Note store facade over a note repository.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note owned by `owner`.
    ///
    /// # Errors
    /// - `Validation` when `content` is blank.
    /// - `UnknownUser` when `owner` does not resolve.
    pub fn create_note(
        &self,
        owner: &UserSlug,
        content: impl Into<String>,
    ) -> Result<Note, ServiceError> {
        let content = content.into();
        if is_blank_content(&content) {
            return Err(ServiceError::invalid_field(
                "content",
                "This field may not be blank.",
            ));
        }

        let mut note = Note::new(owner.clone(), content, now_utc());
        for attempt in 1..=MAX_ID_ATTEMPTS {
            match self.repo.create_note(&note) {
                Ok(()) => {
                    info!(
                        "event=note_create module=note_service status=ok note={} owner={} content_chars={}",
                        note.slug,
                        owner,
                        note.content.chars().count()
                    );
                    return self.repo.get_note(&note.slug)?.ok_or(
                        ServiceError::InconsistentState("created note not found in read-back"),
                    );
                }
                Err(RepoError::IdCollision(target)) => {
                    warn!(
                        "event=note_create module=note_service status=retry target={target} attempt={attempt}"
                    );
                    note.slug = NoteSlug::generate();
                }
                Err(RepoError::UserNotFound(missing)) => {
                    info!(
                        "event=note_create module=note_service status=rejected reason=unknown_user owner={missing}"
                    );
                    return Err(ServiceError::UnknownUser(missing));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ServiceError::InconsistentState(
            "exhausted note slug generation attempts",
        ))
    }

    /// Gets one note by slug.
    pub fn get_note(&self, slug: &NoteSlug) -> Result<Note, ServiceError> {
        self.repo
            .get_note(slug)?
            .ok_or_else(|| ServiceError::NoteNotFound(slug.clone()))
    }

    /// Replaces note content on behalf of `editor` and records the revision.
    ///
    /// # Errors
    /// - `Validation` when `new_content` is blank.
    /// - `NoteNotFound` when the note does not resolve.
    /// - `UnknownUser` when `editor` does not resolve; the note and ledger
    ///   are left untouched.
    pub fn update_note(
        &mut self,
        slug: &NoteSlug,
        new_content: impl Into<String>,
        editor: &UserSlug,
    ) -> Result<Note, ServiceError> {
        let new_content = new_content.into();
        if is_blank_content(&new_content) {
            return Err(ServiceError::invalid_field(
                "content",
                "This field may not be blank.",
            ));
        }

        let started_at = Instant::now();
        match self
            .repo
            .update_note_content(slug, &new_content, editor, now_utc())
        {
            Ok(update) => {
                info!(
                    "event=note_update module=note_service status=ok note={} editor={} revision={} duration_ms={}",
                    slug,
                    editor,
                    update.revision_id,
                    started_at.elapsed().as_millis()
                );
                Ok(update.note)
            }
            Err(RepoError::UserNotFound(missing)) => {
                info!(
                    "event=note_update module=note_service status=rejected reason=unknown_user note={slug} editor={missing}"
                );
                Err(ServiceError::UnknownUser(missing))
            }
            Err(err) => Err(err.into()),
        }
    }
}
