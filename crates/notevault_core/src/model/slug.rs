//! Opaque slug identifiers for users and notes.
//!
//! # Invariants
//! - Generated slugs are lowercase hex prefixes of a random UUIDv4.
//! - Parsed slugs are non-empty, at most `SLUG_MAX_LEN` chars, and only
//!   contain ASCII letters, digits, `-` or `_`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Maximum accepted slug length.
pub const SLUG_MAX_LEN: usize = 50;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid slug regex"));

/// Reasons a raw string is not a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    Empty,
    TooLong(usize),
    InvalidCharacters,
}

impl Display for SlugError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "slug must not be empty"),
            Self::TooLong(len) => {
                write!(f, "slug is {len} chars long; at most {SLUG_MAX_LEN} allowed")
            }
            Self::InvalidCharacters => write!(
                f,
                "slug may only contain letters, numbers, underscores or hyphens"
            ),
        }
    }
}

impl Error for SlugError {}

fn validate_slug(value: &str) -> Result<(), SlugError> {
    if value.is_empty() {
        return Err(SlugError::Empty);
    }
    let len = value.chars().count();
    if len > SLUG_MAX_LEN {
        return Err(SlugError::TooLong(len));
    }
    if !SLUG_RE.is_match(value) {
        return Err(SlugError::InvalidCharacters);
    }
    Ok(())
}

fn random_hex(len: usize) -> String {
    let mut value = Uuid::new_v4().simple().to_string();
    value.truncate(len);
    value
}

macro_rules! slug_type {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Length of slugs produced by `generate`.
            pub const GENERATED_LEN: usize = $len;

            /// Generates a fresh random slug.
            ///
            /// Uniqueness is enforced by storage; callers retry on collision.
            pub fn generate() -> Self {
                Self(random_hex($len))
            }

            /// Parses caller input into a slug, trimming surrounding whitespace.
            pub fn parse(value: &str) -> Result<Self, SlugError> {
                let trimmed = value.trim();
                validate_slug(trimmed)?;
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = SlugError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

slug_type!(
    /// Stable identifier of a user; doubles as the user primary key.
    UserSlug,
    10
);

slug_type!(
    /// Stable identifier of a note.
    NoteSlug,
    9
);
