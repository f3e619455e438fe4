use std::time::Duration;

use crate::error::StateError;
use crate::key::{KeyKind, StateKey};
use crate::store::StateStore;

fn test_key(kind: KeyKind, id: &str) -> StateKey {
    StateKey::new("test-ns", kind, id)
}

/// Run the full state store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any backend operation fails.
pub async fn run_store_conformance_tests(store: &dyn StateStore) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_set_and_get(store).await?;
    test_overwrite(store).await?;
    test_delete(store).await?;
    test_ttl_set(store).await?;
    test_scan_keys(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::Draft, "missing");
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_set_and_get(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::Draft, "set-get");
    store.set(&key, "hello", None).await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("hello"));
    Ok(())
}

async fn test_overwrite(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::Draft, "overwrite");
    store.set(&key, "v1", None).await?;
    store.set(&key, "v2", None).await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("v2"), "set should overwrite");
    Ok(())
}

async fn test_delete(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::Draft, "to-delete");
    store.set(&key, "bye", None).await?;
    let existed = store.delete(&key).await?;
    assert!(existed, "delete should return true for existing key");
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get after delete should return None");

    let existed = store.delete(&key).await?;
    assert!(!existed, "delete on missing key should return false");
    Ok(())
}

async fn test_ttl_set(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key(KeyKind::Draft, "ttl-test");
    store
        .set(&key, "ephemeral", Some(Duration::from_secs(3600)))
        .await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("ephemeral"));
    Ok(())
}

async fn test_scan_keys(store: &dyn StateStore) -> Result<(), StateError> {
    let kind = KeyKind::Custom("scan".into());
    store.set(&test_key(kind.clone(), "a"), "1", None).await?;
    store.set(&test_key(kind.clone(), "b"), "2", None).await?;
    store
        .set(&StateKey::new("other-ns", kind.clone(), "c"), "3", None)
        .await?;

    let mut entries = store.scan_keys("test-ns", kind).await?;
    entries.sort();
    assert_eq!(
        entries,
        vec![
            ("test-ns:scan:a".to_owned(), "1".to_owned()),
            ("test-ns:scan:b".to_owned(), "2".to_owned()),
        ],
        "scan should only return keys of the namespace and kind"
    );
    Ok(())
}
