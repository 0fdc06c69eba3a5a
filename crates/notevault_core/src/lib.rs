//! Core domain logic for notevault.
//! This crate is the single source of truth for note mutation, versioning
//! and sharing invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::Note;
pub use model::revision::{format_modified_time, RevisionEntry, RevisionHistory};
pub use model::share::{RecipientOutcome, ShareGrant, ShareOutcome, SkipReason};
pub use model::slug::{NoteSlug, SlugError, UserSlug};
pub use model::token::AuthToken;
pub use model::user::User;
pub use repo::note_repo::{NoteRepository, NoteUpdate, SqliteNoteRepository};
pub use repo::revision_repo::{RevisionRepository, SqliteRevisionRepository};
pub use repo::share_repo::{ShareRepository, SqliteShareRepository};
pub use repo::token_repo::{SqliteTokenRepository, TokenRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::auth_service::{AuthService, LoginSession, LogoutStatus};
pub use service::credential::CredentialHasher;
pub use service::identity_service::{IdentityService, Registration};
pub use service::note_service::NoteService;
pub use service::revision_service::RevisionService;
pub use service::share_service::ShareService;
pub use service::{
    parse_note_slug_field, parse_user_slug_field, ErrorKind, FieldError, ServiceError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
