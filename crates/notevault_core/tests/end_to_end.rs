use notevault_core::db::open_db_in_memory;
use notevault_core::{
    AuthService, CredentialHasher, IdentityService, NoteService, Registration, RevisionService,
    ShareService, SqliteNoteRepository, SqliteRevisionRepository, SqliteShareRepository,
    SqliteTokenRepository, SqliteUserRepository,
};

#[test]
fn register_create_update_and_read_history() {
    let mut conn = open_db_in_memory().unwrap();

    let author = {
        let repo = SqliteUserRepository::try_new(&conn).unwrap();
        IdentityService::with_hasher(repo, CredentialHasher::with_cost(64, 1, 1).unwrap())
            .register(&Registration {
                email: "a@x.com".to_string(),
                password: "pw".to_string(),
                ..Registration::default()
            })
            .unwrap()
    };

    let note_slug = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut notes = NoteService::new(repo);
        let note = notes.create_note(&author.slug, "hello").unwrap();
        notes
            .update_note(&note.slug, "hello world", &author.slug)
            .unwrap();
        assert_eq!(notes.get_note(&note.slug).unwrap().content, "hello world");
        note.slug
    };

    let repo = SqliteRevisionRepository::try_new(&conn).unwrap();
    let history = RevisionService::new(repo).history(&note_slug).unwrap();
    assert_eq!(history.len(), 1);
    let entry = history.latest().unwrap();
    assert_eq!(entry.original_content, "hello");
    assert_eq!(entry.updated_content, "hello world");
    assert_eq!(entry.updated_by_email, "a@x.com");

    let rendered = serde_json::to_value(entry).unwrap();
    assert_eq!(rendered["original_content"], "hello");
    assert_eq!(rendered["updated_by_email"], "a@x.com");
}

#[test]
fn token_holder_shares_note_with_collaborator_who_edits_it() {
    let mut conn = open_db_in_memory().unwrap();
    let hasher = CredentialHasher::with_cost(64, 1, 1).unwrap();

    let (owner_session, collaborator) = {
        let users = SqliteUserRepository::try_new(&conn).unwrap();
        let identity = IdentityService::with_hasher(users, hasher.clone());
        identity
            .register(&Registration {
                email: "owner@x.com".to_string(),
                password: "owner-pw".to_string(),
                first_name: Some("Olive".to_string()),
                last_name: None,
            })
            .unwrap();
        let collaborator = identity
            .register(&Registration {
                email: "collab@x.com".to_string(),
                password: "collab-pw".to_string(),
                ..Registration::default()
            })
            .unwrap();

        let tokens = SqliteTokenRepository::try_new(&conn).unwrap();
        let users = SqliteUserRepository::try_new(&conn).unwrap();
        let auth = AuthService::new(IdentityService::with_hasher(users, hasher.clone()), tokens);
        (auth.login("owner@x.com", "owner-pw").unwrap(), collaborator)
    };
    assert_eq!(owner_session.user_name, "Olive");

    let owner = {
        let tokens = SqliteTokenRepository::try_new(&conn).unwrap();
        let users = SqliteUserRepository::try_new(&conn).unwrap();
        AuthService::new(IdentityService::with_hasher(users, hasher), tokens)
            .authenticate(&owner_session.token)
            .unwrap()
    };

    let note_slug = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        NoteService::new(repo)
            .create_note(&owner.slug, "draft")
            .unwrap()
            .slug
    };

    let outcome = {
        let repo = SqliteShareRepository::try_new(&mut conn).unwrap();
        ShareService::new(repo)
            .share(&note_slug, &owner.slug, &[collaborator.slug.as_str()])
            .unwrap()
    };
    assert_eq!(outcome.grant.shared_with, vec![collaborator.slug.clone()]);

    {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let updated = NoteService::new(repo)
            .update_note(&note_slug, "final", &collaborator.slug)
            .unwrap();
        assert_eq!(updated.created_by, owner.slug);
        assert_eq!(updated.last_modified_by, collaborator.slug);
    }

    let repo = SqliteRevisionRepository::try_new(&conn).unwrap();
    let history = RevisionService::new(repo).history(&note_slug).unwrap();
    assert_eq!(history.latest().unwrap().updated_by_email, "collab@x.com");
}
