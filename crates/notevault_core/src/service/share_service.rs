//! Sharing registry use-case service.
//!
//! # Responsibility
//! - Create share grants from a note to a list of requested recipients.
//! - List the grants recorded for a note.
//!
//! # Invariants
//! - Unknown note or sharer fails the whole operation with a not-found error.
//! - Unresolvable recipients are dropped without error and reported in the
//!   returned `ShareOutcome`.
//! - A grant whose recipients all failed to resolve is still persisted and
//!   returned; it is logged at warn level.

use crate::model::now_utc;
use crate::model::share::{ShareGrant, ShareOutcome};
use crate::model::slug::{NoteSlug, UserSlug};
use crate::repo::share_repo::ShareRepository;
use crate::service::ServiceError;
use log::{info, warn};

/// Sharing registry facade over a share repository.
pub struct ShareService<R: ShareRepository> {
    repo: R,
}

impl<R: ShareRepository> ShareService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Shares `note_slug` from `sharer` with every resolvable recipient.
    ///
    /// # Errors
    /// - `NoteNotFound` / `UserNotFound` when the note or sharer is unknown.
    pub fn share<S: AsRef<str>>(
        &mut self,
        note_slug: &NoteSlug,
        sharer: &UserSlug,
        recipient_slugs: &[S],
    ) -> Result<ShareOutcome, ServiceError> {
        let requested: Vec<String> = recipient_slugs
            .iter()
            .map(|slug| slug.as_ref().to_string())
            .collect();
        let outcome = self
            .repo
            .create_grant(note_slug, sharer, &requested, now_utc())?;

        let granted = outcome.grant.shared_with.len();
        let skipped = outcome.skipped_count();
        if granted == 0 {
            warn!(
                "event=note_share module=share_service status=empty_grant note={} sharer={} grant={} requested={} skipped={}",
                note_slug,
                sharer,
                outcome.grant.id,
                requested.len(),
                skipped
            );
        } else {
            info!(
                "event=note_share module=share_service status=ok note={} sharer={} grant={} granted={} skipped={}",
                note_slug, sharer, outcome.grant.id, granted, skipped
            );
        }
        Ok(outcome)
    }

    /// Lists every grant of a note in creation order.
    pub fn grants_for_note(&self, note_slug: &NoteSlug) -> Result<Vec<ShareGrant>, ServiceError> {
        self.repo
            .grants_for_note(note_slug)?
            .ok_or_else(|| ServiceError::NoteNotFound(note_slug.clone()))
    }
}
