//! Bearer token model for the session gateway.

use crate::model::slug::UserSlug;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const TOKEN_BYTES: usize = 20;

/// Bearer token bound to a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// 40 lowercase hex chars.
    pub token: String,
    pub user_slug: UserSlug,
    pub created_at: DateTime<Utc>,
}

/// Generates a random 40-char hex token value from the OS RNG.
pub fn generate_token_value() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
