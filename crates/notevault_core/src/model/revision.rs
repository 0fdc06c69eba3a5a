//! Revision ledger model.
//!
//! # Invariants
//! - Entries are immutable once written.
//! - Ordered by insertion, entry k's `updated_content` equals entry k+1's
//!   `original_content`.

use crate::model::slug::{NoteSlug, UserSlug};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `dd-mm-yyyy at hh:mm AM/PM`.
pub const MODIFIED_TIME_FORMAT: &str = "%d-%m-%Y at %I:%M %p";

/// One recorded content change of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionEntry {
    /// Ledger sequence number; increases with insertion order.
    pub id: i64,
    pub note_slug: NoteSlug,
    pub original_content: String,
    pub updated_content: String,
    pub updated_by: UserSlug,
    /// Email of `updated_by` at read time.
    pub updated_by_email: String,
    pub timestamp: DateTime<Utc>,
}

impl RevisionEntry {
    /// Timestamp rendered with `MODIFIED_TIME_FORMAT`.
    pub fn modified_time(&self) -> String {
        format_modified_time(self.timestamp)
    }
}

/// Formats a ledger timestamp as `dd-mm-yyyy at hh:mm AM/PM` (UTC).
pub fn format_modified_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format(MODIFIED_TIME_FORMAT).to_string()
}

/// Full history of one note in insertion order.
///
/// Iteration borrows the entries, so the sequence can be walked any number
/// of times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionHistory {
    pub note_slug: NoteSlug,
    entries: Vec<RevisionEntry>,
}

impl RevisionHistory {
    pub fn new(note_slug: NoteSlug, entries: Vec<RevisionEntry>) -> Self {
        Self { note_slug, entries }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RevisionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest entry, if any.
    pub fn latest(&self) -> Option<&RevisionEntry> {
        self.entries.last()
    }

    /// Checks that every entry starts from the content the previous one left.
    pub fn is_chain_consistent(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].updated_content == pair[1].original_content)
    }

    pub fn into_entries(self) -> Vec<RevisionEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a RevisionHistory {
    type Item = &'a RevisionEntry;
    type IntoIter = std::slice::Iter<'a, RevisionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
