use std::sync::Once;

use emotrack_core::{Credential, Identity, PersistedSession, Session, SessionState, SessionView};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(client_logging::initialize_for_tests);
}

fn identity(user_id: &str, email: &str) -> Identity {
    Identity {
        user_id: user_id.to_string(),
        email: email.to_string(),
    }
}

fn persisted(token: Option<&str>, email: Option<&str>, user_id: Option<&str>) -> PersistedSession {
    PersistedSession {
        token: token.map(str::to_string),
        user_email: email.map(str::to_string),
        user_id: user_id.map(str::to_string),
    }
}

#[test]
fn restore_with_all_fields_is_authenticated() {
    init_logging();
    let session = Session::restore(&persisted(Some("abc"), Some("user@test.com"), Some("1")));

    assert!(session.is_authenticated());
    assert_eq!(session.identity(), Some(&identity("1", "user@test.com")));
    assert_eq!(session.credential().map(|(c, _)| c.as_str()), Some("abc"));
}

#[test]
fn restore_fails_closed_on_partial_fields() {
    init_logging();
    let cases = [
        persisted(Some("abc"), None, None),
        persisted(Some("abc"), Some("user@test.com"), None),
        persisted(Some("abc"), None, Some("1")),
        persisted(None, Some("user@test.com"), Some("1")),
        persisted(Some("  "), Some("user@test.com"), Some("1")),
    ];
    for case in cases {
        let session = Session::restore(&case);
        assert_eq!(session.state(), &SessionState::Anonymous, "{case:?}");
        assert_eq!(session.identity(), None);
        assert_eq!(SessionView::of(&session), SessionView::default());
    }
}

#[test]
fn logout_is_idempotent() {
    init_logging();
    let mut session = Session::new();
    session.authenticate(Credential::new("abc"), identity("1", "a@b.c"));

    assert!(session.logout());
    assert!(!session.logout());
    assert!(!session.logout());
    assert_eq!(session.to_persisted(), PersistedSession::default());
}

#[test]
fn reauthentication_replaces_previous_identity() {
    init_logging();
    let mut session = Session::new();
    session.authenticate(Credential::new("first"), identity("1", "first@test.com"));
    session.authenticate(Credential::new("second"), identity("2", "second@test.com"));

    assert_eq!(session.identity(), Some(&identity("2", "second@test.com")));
    assert_eq!(
        session.to_persisted(),
        persisted(Some("second"), Some("second@test.com"), Some("2"))
    );
}

#[test]
fn invalidate_only_ends_the_session_that_issued_the_request() {
    init_logging();
    let mut session = Session::new();
    let old_epoch = session.authenticate(Credential::new("old"), identity("1", "a@b.c"));
    let new_epoch = session.authenticate(Credential::new("new"), identity("1", "a@b.c"));
    assert!(new_epoch > old_epoch);

    assert!(!session.invalidate(Some(old_epoch)));
    assert!(!session.invalidate(None));
    assert!(session.is_authenticated());

    assert!(session.invalidate(Some(new_epoch)));
    assert!(!session.invalidate(Some(new_epoch)));
    assert!(!session.is_authenticated());
}
