use super::*;
use crate::state::test_helpers::{BrokenUserStore, MemoryUserStore};
use std::sync::atomic::Ordering;

fn resolver_with(store: &Arc<MemoryUserStore>) -> IdentityResolver {
    IdentityResolver::new(store.clone())
}

// =============================================================================
// Existing user
// =============================================================================

#[tokio::test]
async fn existing_user_is_returned_without_create() {
    let store = Arc::new(MemoryUserStore::with_user("bob@example.com", "Robert Ample"));
    let resolver = resolver_with(&store);

    let identity = resolver.resolve("bob@example.com", Some("Bobby")).await.unwrap();

    assert_eq!(identity.name, "Robert Ample");
    assert_eq!(store.finds.load(Ordering::SeqCst), 1);
    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn existing_user_does_not_need_a_name() {
    let store = Arc::new(MemoryUserStore::with_user("bob@example.com", "Robert Ample"));
    let identity = resolver_with(&store).resolve("bob@example.com", None).await.unwrap();
    assert_eq!(identity.name, "Robert Ample");
}

// =============================================================================
// New user
// =============================================================================

#[tokio::test]
async fn missing_user_is_created_with_given_name() {
    let store = Arc::new(MemoryUserStore::default());
    let identity = resolver_with(&store)
        .resolve("new@example.com", Some("New Person"))
        .await
        .unwrap();

    assert_eq!(identity.name, "New Person");
    assert_eq!(store.creates.load(Ordering::SeqCst), 1);
    let stored = store.find_by_email("new@example.com").await.unwrap();
    assert_eq!(stored.id, identity.user_id);
}

#[tokio::test]
async fn missing_user_without_name_is_rejected() {
    let store = Arc::new(MemoryUserStore::default());
    let err = resolver_with(&store).resolve("new@example.com", None).await.unwrap_err();
    assert!(matches!(err, IdentityError::MissingName));
    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolving_twice_yields_same_user_id() {
    let store = Arc::new(MemoryUserStore::default());
    let resolver = resolver_with(&store);

    let first = resolver.resolve("same@example.com", Some("First Name")).await.unwrap();
    let second = resolver.resolve("same@example.com", Some("Other Name")).await.unwrap();

    assert_eq!(first.user_id, second.user_id);
    assert_eq!(second.name, "First Name");
    assert_eq!(store.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn distinct_emails_get_distinct_ids() {
    let store = Arc::new(MemoryUserStore::default());
    let resolver = resolver_with(&store);

    let a = resolver.resolve("a@example.com", Some("A")).await.unwrap();
    let b = resolver.resolve("b@example.com", Some("B")).await.unwrap();

    assert_ne!(a.user_id, b.user_id);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn lookup_failure_is_not_treated_as_not_found() {
    let resolver = IdentityResolver::new(Arc::new(BrokenUserStore::lookup_fails()));
    let err = resolver.resolve("bob@example.com", Some("Bob")).await.unwrap_err();
    assert!(matches!(err, IdentityError::Lookup(StoreError::Db(_))), "got {err:?}");
}

#[tokio::test]
async fn create_conflict_fails_without_retry() {
    let store = Arc::new(BrokenUserStore::create_conflicts());
    let resolver = IdentityResolver::new(store.clone());

    let err = resolver.resolve("race@example.com", Some("Racer")).await.unwrap_err();

    assert!(matches!(err, IdentityError::Create(StoreError::Conflict)), "got {err:?}");
    assert_eq!(store.finds.load(Ordering::SeqCst), 1);
}

#[test]
fn identity_error_messages_name_the_step() {
    assert!(IdentityError::Lookup(StoreError::NotFound).to_string().contains("looking up"));
    assert!(IdentityError::Create(StoreError::Conflict).to_string().contains("creating"));
}
