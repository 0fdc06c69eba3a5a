//! Domain model for users, notes, revisions and share grants.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own identifier (slug) generation and validation.
//!
//! # Invariants
//! - Every user and note is identified by a stable, never reassigned slug.
//! - Timestamps carry millisecond precision so storage round-trips are exact.

use chrono::{DateTime, Utc};

pub mod note;
pub mod revision;
pub mod share;
pub mod slug;
pub mod token;
pub mod user;

/// Current UTC time truncated to millisecond precision.
pub fn now_utc() -> DateTime<Utc> {
    from_millis(Utc::now().timestamp_millis()).unwrap_or_else(Utc::now)
}

/// Converts epoch milliseconds into a UTC timestamp.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn from_millis(value: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
}
