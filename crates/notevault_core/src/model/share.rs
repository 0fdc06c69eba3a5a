//! Share grant model.
//!
//! # Invariants
//! - A grant references exactly one note and one granting user.
//! - `shared_with` holds each recipient at most once, in the order added.
//! - Grants are independent; sharing a note again creates a new grant.

use crate::model::slug::{NoteSlug, SlugError, UserSlug};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record of a note made visible to a set of recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub id: i64,
    pub note_slug: NoteSlug,
    pub shared_by: UserSlug,
    pub shared_with: Vec<UserSlug>,
    pub shared_at: DateTime<Utc>,
}

/// Why a requested recipient was left out of a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The entry is not a syntactically valid slug.
    Malformed,
    /// No user has this slug.
    UnknownUser,
}

impl From<SlugError> for SkipReason {
    fn from(_: SlugError) -> Self {
        Self::Malformed
    }
}

/// Per-entry result of resolving a share request's recipient list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecipientOutcome {
    /// Recipient resolved and was added to the grant.
    Granted { slug: UserSlug },
    /// Recipient resolved but was already listed earlier in the same request.
    Duplicate { slug: UserSlug },
    /// Entry did not resolve and was dropped without failing the share.
    Skipped { requested: String, reason: SkipReason },
}

/// Result of a share operation: the persisted grant and what happened to
/// every requested recipient, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareOutcome {
    pub grant: ShareGrant,
    pub recipients: Vec<RecipientOutcome>,
}

impl ShareOutcome {
    /// Requested entries that were dropped.
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.recipients.iter().filter_map(|outcome| match outcome {
            RecipientOutcome::Skipped { requested, reason } => Some((requested.as_str(), reason)),
            _ => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }
}
