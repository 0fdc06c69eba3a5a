use notevault_core::db::migrations::latest_version;
use notevault_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "users",
        "notes",
        "note_history",
        "shared_notes",
        "shared_note_recipients",
        "auth_tokens",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn foreign_keys_are_enforced_on_open() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let result = conn.execute(
        "INSERT INTO notes (slug, content, created_by, last_modified_by, created_at, updated_at)
         VALUES ('abcdef123', 'orphan', 'nobody0000', 'nobody0000', 0, 0);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn note_history_rows_cannot_be_rewritten() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (slug, email, password_hash, created_at)
         VALUES ('aaaaaaaaaa', 'a@x.com', 'hash', 0);
         INSERT INTO notes (slug, content, created_by, last_modified_by, created_at, updated_at)
         VALUES ('bbbbbbbbb', 'v2', 'aaaaaaaaaa', 'aaaaaaaaaa', 0, 0);
         INSERT INTO note_history (note_id, original_content, updated_content, updated_by, timestamp)
         VALUES (1, 'v1', 'v2', 'aaaaaaaaaa', 0);",
    )
    .unwrap();

    let err = conn
        .execute("UPDATE note_history SET updated_content = 'forged';", [])
        .unwrap_err();
    assert!(err.to_string().contains("append-only"));
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notevault.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "notes");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
