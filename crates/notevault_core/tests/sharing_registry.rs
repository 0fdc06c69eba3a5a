use notevault_core::db::open_db_in_memory;
use notevault_core::{
    CredentialHasher, ErrorKind, IdentityService, NoteService, NoteSlug, RecipientOutcome,
    Registration, ShareService, SkipReason, SqliteNoteRepository, SqliteShareRepository,
    SqliteUserRepository, User, UserSlug,
};
use rusqlite::Connection;

fn register(conn: &Connection, email: &str) -> User {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    let service =
        IdentityService::with_hasher(repo, CredentialHasher::with_cost(64, 1, 1).unwrap());
    service
        .register(&Registration {
            email: email.to_string(),
            password: "pw".to_string(),
            ..Registration::default()
        })
        .unwrap()
}

fn create_note(conn: &mut Connection, owner: &User, content: &str) -> NoteSlug {
    let repo = SqliteNoteRepository::try_new(conn).unwrap();
    NoteService::new(repo)
        .create_note(&owner.slug, content)
        .unwrap()
        .slug
}

#[test]
fn share_grants_only_resolvable_recipients() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "owner@example.com");
    let friend = register(&conn, "friend@example.com");
    let note = create_note(&mut conn, &owner, "shared text");

    let repo = SqliteShareRepository::try_new(&mut conn).unwrap();
    let mut service = ShareService::new(repo);
    let outcome = service
        .share(&note, &owner.slug, &[friend.slug.as_str(), "bogusSlug"])
        .unwrap();

    assert_eq!(outcome.grant.note_slug, note);
    assert_eq!(outcome.grant.shared_by, owner.slug);
    assert_eq!(outcome.grant.shared_with, vec![friend.slug.clone()]);
    assert_eq!(
        outcome.recipients,
        vec![
            RecipientOutcome::Granted {
                slug: friend.slug.clone()
            },
            RecipientOutcome::Skipped {
                requested: "bogusSlug".to_string(),
                reason: SkipReason::UnknownUser,
            },
        ]
    );
    assert_eq!(outcome.skipped_count(), 1);
}

#[test]
fn malformed_and_repeated_recipients_are_reported() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "owner@example.com");
    let friend = register(&conn, "friend@example.com");
    let note = create_note(&mut conn, &owner, "text");

    let repo = SqliteShareRepository::try_new(&mut conn).unwrap();
    let mut service = ShareService::new(repo);
    let requested = vec![
        friend.slug.to_string(),
        "not a slug!".to_string(),
        friend.slug.to_string(),
    ];
    let outcome = service.share(&note, &owner.slug, &requested).unwrap();

    assert_eq!(outcome.grant.shared_with, vec![friend.slug.clone()]);
    assert!(matches!(
        outcome.recipients[1],
        RecipientOutcome::Skipped {
            reason: SkipReason::Malformed,
            ..
        }
    ));
    assert_eq!(
        outcome.recipients[2],
        RecipientOutcome::Duplicate {
            slug: friend.slug.clone()
        }
    );
}

#[test]
fn empty_recipient_list_still_creates_a_grant() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "owner@example.com");
    let note = create_note(&mut conn, &owner, "text");

    let repo = SqliteShareRepository::try_new(&mut conn).unwrap();
    let mut service = ShareService::new(repo);
    let outcome = service
        .share(&note, &owner.slug, &["ghost00000"])
        .unwrap();
    assert!(outcome.grant.shared_with.is_empty());

    let grants = service.grants_for_note(&note).unwrap();
    assert_eq!(grants.len(), 1);
    assert!(grants[0].shared_with.is_empty());
}

#[test]
fn unknown_note_or_sharer_aborts_without_writing() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "owner@example.com");
    let friend = register(&conn, "friend@example.com");
    let note = create_note(&mut conn, &owner, "text");

    {
        let repo = SqliteShareRepository::try_new(&mut conn).unwrap();
        let mut service = ShareService::new(repo);

        let err = service
            .share(
                &NoteSlug::parse("nothere00").unwrap(),
                &owner.slug,
                &[friend.slug.as_str()],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = service
            .share(
                &note,
                &UserSlug::parse("ghost00000").unwrap(),
                &[friend.slug.as_str()],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    let grants: i64 = conn
        .query_row("SELECT COUNT(*) FROM shared_notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(grants, 0);
}

#[test]
fn each_share_call_creates_an_independent_grant() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "owner@example.com");
    let first = register(&conn, "first@example.com");
    let second = register(&conn, "second@example.com");
    let note = create_note(&mut conn, &owner, "text");

    let repo = SqliteShareRepository::try_new(&mut conn).unwrap();
    let mut service = ShareService::new(repo);
    let a = service
        .share(&note, &owner.slug, &[first.slug.as_str()])
        .unwrap();
    let b = service
        .share(
            &note,
            &first.slug,
            &[second.slug.as_str(), first.slug.as_str()],
        )
        .unwrap();
    assert_ne!(a.grant.id, b.grant.id);

    let grants = service.grants_for_note(&note).unwrap();
    assert_eq!(grants, vec![a.grant, b.grant]);
    assert_eq!(
        grants[1].shared_with,
        vec![second.slug.clone(), first.slug.clone()]
    );

    let err = service
        .grants_for_note(&NoteSlug::parse("nothere00").unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
