//! Subcommand handlers.
//!
//! Each handler wires one core operation to the SQLite repositories and
//! turns its outcome into an [`Envelope`]. Service failures become failure
//! envelopes; only process-level problems surface as `anyhow` errors.

use crate::output::{history_rows, Envelope};
use anyhow::Result;
use log::debug;
use notevault_core::{
    parse_note_slug_field, AuthService, IdentityService, LogoutStatus, NoteService, Registration,
    RevisionService, ServiceError, ShareService, SqliteNoteRepository, SqliteRevisionRepository,
    SqliteShareRepository, SqliteTokenRepository, SqliteUserRepository, User,
};
use rusqlite::Connection;
use serde_json::json;

/// Input of `signup`.
pub struct SignupArgs {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub fn signup(conn: &Connection, args: SignupArgs) -> Result<Envelope> {
    let registration = Registration {
        email: args.email,
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
    };
    let result = SqliteUserRepository::try_new(conn)
        .map_err(ServiceError::from)
        .and_then(|repo| IdentityService::new(repo).register(&registration));

    match result {
        Ok(user) => {
            let message = format!("User {} created successfully", user.login_id());
            Envelope::success(message, &user)
        }
        Err(err) => Ok(Envelope::failure("Unable to register user", &err)),
    }
}

pub fn login(conn: &Connection, username: &str, password: &str) -> Result<Envelope> {
    match auth_service(conn).and_then(|auth| auth.login(username, password)) {
        Ok(session) => {
            let message = format!("User {} logged in successfully", session.user_name);
            Envelope::success(message, &session)
        }
        Err(err) => Ok(Envelope::failure("Unable to log in", &err)),
    }
}

pub fn logout(conn: &Connection, token: Option<&str>) -> Result<Envelope> {
    match auth_service(conn).and_then(|auth| auth.logout(token.unwrap_or_default())) {
        Ok(LogoutStatus::LoggedOut) => Ok(Envelope::message_only("User logged out successfully")),
        Ok(LogoutStatus::AlreadyLoggedOut) => Ok(Envelope::message_only("User already logged out")),
        Err(err) => Ok(Envelope::failure("Unable to log out", &err)),
    }
}

pub fn create(conn: &mut Connection, token: Option<&str>, content: String) -> Result<Envelope> {
    let result = acting_user(conn, token).and_then(|user| {
        let repo = SqliteNoteRepository::try_new(conn)?;
        NoteService::new(repo).create_note(&user.slug, content)
    });

    match result {
        Ok(note) => Envelope::success("Note created successfully", &note),
        Err(err) => Ok(Envelope::failure("Failed to create note", &err)),
    }
}

pub fn share(
    conn: &mut Connection,
    token: Option<&str>,
    note: &str,
    recipients: &[String],
) -> Result<Envelope> {
    let result = acting_user(conn, token).and_then(|user| {
        let note_slug = parse_note_slug_field("note", note)?;
        let repo = SqliteShareRepository::try_new(conn)?;
        ShareService::new(repo).share(&note_slug, &user.slug, recipients)
    });

    match result {
        Ok(outcome) => {
            debug!(
                "event=cli_share module=cli status=ok grant={} skipped={}",
                outcome.grant.id,
                outcome.skipped_count()
            );
            Envelope::success("Note shared successfully", &outcome)
        }
        Err(err) => Ok(Envelope::failure("Failed to share note", &err)),
    }
}

pub fn get(conn: &mut Connection, token: Option<&str>, slug: &str) -> Result<Envelope> {
    let result = acting_user(conn, token).and_then(|_| {
        let note_slug = parse_note_slug_field("slug", slug)?;
        let repo = SqliteNoteRepository::try_new(conn)?;
        NoteService::new(repo).get_note(&note_slug)
    });

    match result {
        Ok(note) => Envelope::success("Note found", &note),
        Err(err) => Ok(Envelope::failure("Note not found", &err)),
    }
}

pub fn update(
    conn: &mut Connection,
    token: Option<&str>,
    slug: &str,
    content: String,
) -> Result<Envelope> {
    let result = acting_user(conn, token).and_then(|user| {
        let note_slug = parse_note_slug_field("slug", slug)?;
        let repo = SqliteNoteRepository::try_new(conn)?;
        NoteService::new(repo).update_note(&note_slug, content, &user.slug)
    });

    match result {
        Ok(note) => Envelope::success("Note updated successfully", &note),
        Err(err) => Ok(Envelope::failure("Failed to update note", &err)),
    }
}

pub fn history(conn: &Connection, token: Option<&str>, slug: &str) -> Result<Envelope> {
    let result = acting_user(conn, token).and_then(|_| {
        let note_slug = parse_note_slug_field("slug", slug)?;
        let repo = SqliteRevisionRepository::try_new(conn)?;
        RevisionService::new(repo).history(&note_slug)
    });

    match result {
        Ok(history) => Envelope::success(
            format!("Found {} revision(s)", history.len()),
            &history_rows(history),
        ),
        Err(err) => Ok(Envelope::failure("Version history not found", &err)),
    }
}

pub fn ping() -> Result<Envelope> {
    Envelope::success(
        notevault_core::ping(),
        &json!({ "core_version": notevault_core::core_version() }),
    )
}

fn auth_service(
    conn: &Connection,
) -> Result<AuthService<SqliteUserRepository<'_>, SqliteTokenRepository<'_>>, ServiceError> {
    let users = SqliteUserRepository::try_new(conn)?;
    let tokens = SqliteTokenRepository::try_new(conn)?;
    Ok(AuthService::new(IdentityService::new(users), tokens))
}

/// Resolves the bearer token into the acting user.
///
/// The borrow of `conn` ends before the caller opens a mutating repository.
fn acting_user(conn: &Connection, token: Option<&str>) -> Result<User, ServiceError> {
    auth_service(conn)?.authenticate(token.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{create, get, history, logout, share, update};
    use crate::output::Envelope;
    use notevault_core::db::open_db_in_memory;
    use notevault_core::{
        AuthService, CredentialHasher, IdentityService, LoginSession, Registration,
        SqliteTokenRepository, SqliteUserRepository,
    };
    use rusqlite::Connection;
    use serde_json::Value;

    fn sign_in(conn: &Connection, email: &str) -> LoginSession {
        let hasher = CredentialHasher::with_cost(64, 1, 1).unwrap();
        let users = SqliteUserRepository::try_new(conn).unwrap();
        IdentityService::with_hasher(users, hasher.clone())
            .register(&Registration {
                email: email.to_string(),
                password: "pw".to_string(),
                ..Registration::default()
            })
            .unwrap();

        let users = SqliteUserRepository::try_new(conn).unwrap();
        let tokens = SqliteTokenRepository::try_new(conn).unwrap();
        AuthService::new(IdentityService::with_hasher(users, hasher), tokens)
            .login(email, "pw")
            .unwrap()
    }

    fn to_json(envelope: &Envelope) -> Value {
        serde_json::to_value(envelope).unwrap()
    }

    fn row_count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    fn assert_auth_failure(envelope: &Envelope) {
        assert!(!envelope.is_success());
        assert_eq!(to_json(envelope)["error"]["kind"], "auth_failure");
    }

    #[test]
    fn create_without_valid_token_writes_nothing() {
        let mut conn = open_db_in_memory().unwrap();
        sign_in(&conn, "owner@example.com");

        assert_auth_failure(&create(&mut conn, None, "text".to_string()).unwrap());
        assert_auth_failure(&create(&mut conn, Some("   "), "text".to_string()).unwrap());
        assert_auth_failure(&create(&mut conn, Some("deadbeef"), "text".to_string()).unwrap());
        assert_eq!(row_count(&conn, "notes"), 0);
    }

    #[test]
    fn revoked_token_is_rejected_by_every_authenticated_command() {
        let mut conn = open_db_in_memory().unwrap();
        let session = sign_in(&conn, "owner@example.com");
        let token = Some(session.token.as_str());

        let created = create(&mut conn, token, "v1".to_string()).unwrap();
        assert!(created.is_success());
        let slug = to_json(&created)["data"]["slug"]
            .as_str()
            .unwrap()
            .to_string();

        let logged_out = logout(&conn, token).unwrap();
        assert_eq!(logged_out.message, "User logged out successfully");
        assert_eq!(
            logout(&conn, token).unwrap().message,
            "User already logged out"
        );

        assert_auth_failure(&update(&mut conn, token, &slug, "v2".to_string()).unwrap());
        assert_auth_failure(&get(&mut conn, token, &slug).unwrap());
        assert_auth_failure(&history(&conn, token, &slug).unwrap());
        assert_auth_failure(
            &share(&mut conn, token, &slug, &[session.user_slug.to_string()]).unwrap(),
        );

        let content: String = conn
            .query_row("SELECT content FROM notes WHERE slug = ?1;", [&slug], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(content, "v1");
        assert_eq!(row_count(&conn, "note_history"), 0);
        assert_eq!(row_count(&conn, "shared_notes"), 0);
    }

    #[test]
    fn update_is_attributed_to_token_holder_and_history_names_editor() {
        let mut conn = open_db_in_memory().unwrap();
        let owner = sign_in(&conn, "owner@example.com");
        let editor = sign_in(&conn, "editor@example.com");

        let created = create(&mut conn, Some(owner.token.as_str()), "v1".to_string()).unwrap();
        let slug = to_json(&created)["data"]["slug"]
            .as_str()
            .unwrap()
            .to_string();

        let shared = share(
            &mut conn,
            Some(owner.token.as_str()),
            &slug,
            &[editor.user_slug.to_string(), "bogusSlug".to_string()],
        )
        .unwrap();
        let shared = to_json(&shared);
        assert_eq!(
            shared["data"]["grant"]["shared_with"][0],
            editor.user_slug.as_str()
        );
        assert_eq!(shared["data"]["recipients"][1]["status"], "skipped");

        let updated = update(&mut conn, Some(editor.token.as_str()), &slug, "v2".to_string()).unwrap();
        let updated = to_json(&updated);
        assert_eq!(updated["data"]["content"], "v2");
        assert_eq!(updated["data"]["created_by"], owner.user_slug.as_str());
        assert_eq!(updated["data"]["last_modified_by"], editor.user_slug.as_str());

        let fetched = to_json(&get(&mut conn, Some(owner.token.as_str()), &slug).unwrap());
        assert_eq!(fetched["data"]["content"], "v2");

        let rows = history(&conn, Some(owner.token.as_str()), &slug).unwrap();
        assert!(rows.is_success());
        let rows = to_json(&rows);
        assert_eq!(rows["data"].as_array().unwrap().len(), 1);
        assert_eq!(rows["data"][0]["note_slug"], slug.as_str());
        assert_eq!(rows["data"][0]["original_content"], "v1");
        assert_eq!(rows["data"][0]["updated_content"], "v2");
        assert_eq!(rows["data"][0]["modified_by"], "editor@example.com");
    }
}
