//! Revision ledger use-case service.
//!
//! The ledger is written only by `NoteService::update_note`; this service
//! exposes the read side.

use crate::model::revision::RevisionHistory;
use crate::model::slug::NoteSlug;
use crate::repo::revision_repo::RevisionRepository;
use crate::service::ServiceError;
use log::debug;

/// Read-only ledger facade.
pub struct RevisionService<R: RevisionRepository> {
    repo: R,
}

impl<R: RevisionRepository> RevisionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the note's revisions in insertion (chronological) order.
    pub fn history(&self, note_slug: &NoteSlug) -> Result<RevisionHistory, ServiceError> {
        let history = self
            .repo
            .history(note_slug)?
            .ok_or_else(|| ServiceError::NoteNotFound(note_slug.clone()))?;
        debug!(
            "event=note_history module=revision_service status=ok note={} entries={}",
            note_slug,
            history.len()
        );
        Ok(history)
    }
}
