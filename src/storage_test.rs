use super::*;

fn temp_token_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("recipebox-test-{}", uuid::Uuid::new_v4()))
        .join(TOKEN_KEY)
}

#[test]
fn memory_store_round_trips_and_removes() {
    let mut store = MemoryTokenStore::new();
    assert_eq!(store.load().unwrap(), None);

    store.save("abc.def.ghi").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("abc.def.ghi"));

    store.remove().unwrap();
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(store.get(), None);
}

#[test]
fn memory_store_blank_token_reads_as_none() {
    let store = MemoryTokenStore::with_token("   ");
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn file_store_missing_file_reads_as_none() {
    let store = FileTokenStore::new(temp_token_path());
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn file_store_creates_parent_dir_and_persists() {
    let path = temp_token_path();
    let mut store = FileTokenStore::new(&path);
    store.save("tok-123").unwrap();

    // A fresh store over the same path sees the token, like a page reload.
    let reopened = FileTokenStore::new(&path);
    assert_eq!(reopened.load().unwrap().as_deref(), Some("tok-123"));

    store.remove().unwrap();
    assert!(!path.exists());
    let _ = std::fs::remove_dir(path.parent().unwrap());
}

#[test]
fn file_store_trims_trailing_newline() {
    let path = temp_token_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "tok-456\n").unwrap();

    let store = FileTokenStore::new(&path);
    assert_eq!(store.load().unwrap().as_deref(), Some("tok-456"));
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_store_remove_absent_file_is_ok() {
    let mut store = FileTokenStore::new(temp_token_path());
    assert!(store.remove().is_ok());
}

#[cfg(unix)]
#[test]
fn file_store_writes_owner_only_file() {
    use std::os::unix::fs::PermissionsExt as _;

    let path = temp_token_path();
    let mut store = FileTokenStore::new(&path);
    store.save("secret").unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn default_path_ends_with_token_key() {
    if let Some(path) = FileTokenStore::default_path() {
        assert!(path.ends_with(".recipebox/jwtToken"));
    }
}

#[cfg(feature = "hydrate")]
#[test]
fn local_storage_store_backs_a_session() {
    fn assert_token_store<S: TokenStore>(_: &S) {}

    let store = LocalStorageTokenStore;
    assert_token_store(&store);
    let session = crate::session::Session::new(store);
    assert!(!session.is_active());
}
