//! Note domain model.
//!
//! # Invariants
//! - `created_by` is set once at creation and never changes.
//! - `last_modified_by` names the user responsible for the current `content`.
//! - `content` equals the newest revision's `updated_content`, or the
//!   creation content while the note has no revisions.

use crate::model::slug::{NoteSlug, UserSlug};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text note owned by its creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub slug: NoteSlug,
    pub content: String,
    pub created_by: UserSlug,
    pub last_modified_by: UserSlug,
    pub created_at: DateTime<Utc>,
    /// Time of the last content write; equals `created_at` for fresh notes.
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a new, not yet persisted note with a generated slug.
    pub fn new(owner: UserSlug, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            slug: NoteSlug::generate(),
            content: content.into(),
            last_modified_by: owner.clone(),
            created_by: owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Returns whether note content is blank (empty or whitespace only).
pub fn is_blank_content(content: &str) -> bool {
    content.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::{is_blank_content, Note};
    use crate::model::now_utc;
    use crate::model::slug::UserSlug;

    #[test]
    fn new_note_attributes_owner_as_creator_and_modifier() {
        let owner = UserSlug::generate();
        let now = now_utc();
        let note = Note::new(owner.clone(), "hello", now);
        assert_eq!(note.created_by, owner);
        assert_eq!(note.last_modified_by, owner);
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(note.slug.as_str().len(), 9);
    }

    #[test]
    fn blank_content_detection() {
        assert!(is_blank_content(""));
        assert!(is_blank_content(" \n\t"));
        assert!(!is_blank_content(" x "));
    }
}
