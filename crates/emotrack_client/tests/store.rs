use std::fs;
use std::sync::Arc;

use emotrack_client::{
    ApiClient, ClientSettings, RonFileStore, RouteTracker, SessionStore, StoreError,
    SESSION_FILENAME,
};
use emotrack_core::PersistedSession;
use tempfile::TempDir;

fn full_session() -> PersistedSession {
    PersistedSession {
        token: Some("abc".to_string()),
        user_email: Some("user@test.com".to_string()),
        user_id: Some("1".to_string()),
    }
}

#[test]
fn missing_file_is_an_empty_session() {
    let temp = TempDir::new().unwrap();
    let store = RonFileStore::new(temp.path().join("state"));
    assert_eq!(store.load().unwrap(), PersistedSession::default());
}

#[test]
fn save_creates_directory_and_round_trips() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("state");
    let store = RonFileStore::new(&dir);

    store.save(&full_session()).unwrap();
    assert!(dir.join(SESSION_FILENAME).is_file());
    assert_eq!(store.load().unwrap(), full_session());

    let replaced = PersistedSession {
        token: Some("def".to_string()),
        ..full_session()
    };
    store.save(&replaced).unwrap();
    assert_eq!(store.load().unwrap(), replaced);
}

#[test]
fn clear_removes_the_file_and_tolerates_absence() {
    let temp = TempDir::new().unwrap();
    let store = RonFileStore::new(temp.path());
    store.save(&full_session()).unwrap();

    store.clear().unwrap();
    assert!(!store.path().exists());
    store.clear().unwrap();
}

#[test]
fn corrupt_file_is_a_parse_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(SESSION_FILENAME), "not ron at all (").unwrap();
    let store = RonFileStore::new(temp.path());
    assert!(matches!(store.load(), Err(StoreError::Parse(_))));
}

#[test]
fn state_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let store = RonFileStore::new(&file_path);
    assert!(matches!(
        store.save(&full_session()),
        Err(StoreError::StateDir(_))
    ));
}

#[test]
fn restore_from_corrupt_file_fails_closed() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(SESSION_FILENAME), "(token: Some(\"abc\"").unwrap();
    let client = ApiClient::connect(
        &ClientSettings::default(),
        Arc::new(RonFileStore::new(temp.path())),
        Arc::new(RouteTracker::default()),
    )
    .unwrap();

    assert!(!client.session().restore().is_authenticated());
}

#[test]
fn restore_from_file_with_missing_keys_fails_closed() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(SESSION_FILENAME), "(token: Some(\"abc\"))").unwrap();
    let store = RonFileStore::new(temp.path());
    assert_eq!(store.load().unwrap().user_email, None);

    let client = ApiClient::connect(
        &ClientSettings::default(),
        Arc::new(store),
        Arc::new(RouteTracker::default()),
    )
    .unwrap();
    assert!(!client.session().restore().is_authenticated());
}
