use console_gate::{
    GateError, MockAuthBackend, PermissionStore, Session, SessionVerifier, VerificationState,
};
use std::sync::Arc;
use tokio::task::yield_now;

async fn wait_for_fetches(backend: &MockAuthBackend, expected: usize) {
    while backend.fetch_calls() < expected {
        yield_now().await;
    }
}

#[tokio::test]
async fn test_concurrent_loads_share_one_fetch() {
    let backend = Arc::new(MockAuthBackend::new().with_token("token", &["users.manage", "shifts.create"]));
    let verifier = SessionVerifier::new(backend.clone());
    let session = verifier.verify("token").await.unwrap().into_session();
    let store = Arc::new(PermissionStore::new(backend.clone()));

    backend.hold_fetches();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let store = Arc::clone(&store);
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            store.load_permissions(&session).await
        }));
    }

    wait_for_fetches(&backend, 1).await;
    for _ in 0..10 {
        yield_now().await;
    }
    assert!(matches!(store.has("users.manage"), Err(GateError::NotReady(_))));
    backend.release_fetches();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(backend.fetch_calls(), 1);
    let first = &results[0];
    assert!(results.iter().all(|set| Arc::ptr_eq(set, first)));
    assert_eq!(store.has("shifts.create"), Ok(true));
}

#[tokio::test]
async fn test_invalidation_during_fetch_discards_result() {
    let backend = Arc::new(MockAuthBackend::new().with_token("token", &["users.manage"]));
    let verifier = SessionVerifier::new(backend.clone());
    let session = verifier.verify("token").await.unwrap().into_session();
    let store = Arc::new(PermissionStore::new(backend.clone()));

    backend.hold_fetches();
    let loader = {
        let store = Arc::clone(&store);
        let session = session.clone();
        tokio::spawn(async move { store.load_permissions(&session).await })
    };

    wait_for_fetches(&backend, 1).await;
    // Logout while the fetch is in flight.
    session.invalidate();
    backend.release_fetches();

    let result = loader.await.unwrap();
    assert!(matches!(result, Err(GateError::PreconditionFailed(_))));
    assert!(matches!(store.has("users.manage"), Err(GateError::NotReady(_))));
    assert!(store.bound_session().is_none());
}

#[tokio::test]
async fn test_replaced_session_result_is_discarded() {
    let backend = Arc::new(
        MockAuthBackend::new()
            .with_token("first", &["users.manage"])
            .with_token("second", &["billing.view"]),
    );
    let verifier = SessionVerifier::new(backend.clone());
    let first = verifier.verify("first").await.unwrap().into_session();
    let store = Arc::new(PermissionStore::new(backend.clone()));

    backend.hold_fetches();
    let stale_loader = {
        let store = Arc::clone(&store);
        let first = first.clone();
        tokio::spawn(async move { store.load_permissions(&first).await })
    };
    wait_for_fetches(&backend, 1).await;

    // A new login supersedes the first session before its fetch lands.
    let second = verifier.verify("second").await.unwrap();
    assert_eq!(first.state(), VerificationState::Invalid);
    backend.release_fetches();

    assert!(matches!(
        stale_loader.await.unwrap(),
        Err(GateError::PreconditionFailed(_))
    ));

    let permissions = store.load_permissions(&second).await.unwrap();
    assert!(permissions.contains("billing.view"));
    assert!(!permissions.contains("users.manage"));
    assert_eq!(store.has("users.manage"), Ok(false));
}

#[tokio::test]
async fn test_rejected_token_then_load_is_precondition_failure() {
    let backend = Arc::new(MockAuthBackend::new());
    let verifier = SessionVerifier::new(backend.clone());
    let store = PermissionStore::new(backend.clone());

    let session = Session::new("rejected-token").unwrap();
    assert_eq!(session.state(), VerificationState::Unverified);

    let result = verifier.verify_session(&session).await;
    assert!(matches!(result, Err(GateError::Unauthenticated(_))));
    assert_eq!(session.state(), VerificationState::Invalid);

    assert!(matches!(
        store.load_permissions(&session).await,
        Err(GateError::PreconditionFailed(_))
    ));
    assert_eq!(backend.fetch_calls(), 0);
}

#[tokio::test]
async fn test_permissions_endpoint_rejection_propagates() {
    let backend = Arc::new(MockAuthBackend::new().with_token("token", &[]));
    let verifier = SessionVerifier::new(backend.clone());
    let verified = verifier.verify("token").await.unwrap();
    let store = PermissionStore::new(backend.clone());

    // Token revoked server-side between verification and the permission fetch.
    let fresh = MockAuthBackend::new();
    let store_with_revoked = PermissionStore::new(Arc::new(fresh));
    assert!(matches!(
        store_with_revoked.load_permissions(&verified).await,
        Err(GateError::Unauthenticated(_))
    ));

    assert!(store.load_permissions(&verified).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_orphaned_by_invalidate_never_reaches_cache() {
    let backend = Arc::new(MockAuthBackend::new().with_token("token", &["old"]));
    let verifier = SessionVerifier::new(backend.clone());
    let session = verifier.verify("token").await.unwrap().into_session();
    let store = Arc::new(PermissionStore::new(backend.clone()));

    let first_gate = backend.hold_fetches();
    let first = {
        let store = Arc::clone(&store);
        let session = session.clone();
        tokio::spawn(async move { store.load_permissions(&session).await })
    };
    wait_for_fetches(&backend, 1).await;

    // Grants change server-side; the cache is cleared and reloaded.
    store.invalidate();
    backend.set_permissions("token", &["new"]);
    let second_gate = backend.hold_fetches();
    let second = {
        let store = Arc::clone(&store);
        let session = session.clone();
        tokio::spawn(async move { store.load_permissions(&session).await })
    };
    wait_for_fetches(&backend, 2).await;

    // The older fetch lands first and must not populate the cache.
    first_gate.release();
    for _ in 0..20 {
        yield_now().await;
    }
    assert!(matches!(store.has("old"), Err(GateError::NotReady(_))));
    assert!(!first.is_finished());

    second_gate.release();
    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(second.contains("new"));
    assert_eq!(store.has("new"), Ok(true));
    assert_eq!(store.has("old"), Ok(false));
    assert_eq!(backend.fetch_calls(), 2);
}

#[tokio::test]
async fn test_invalidate_during_fetch_reloads_for_current_session() {
    let backend = Arc::new(MockAuthBackend::new().with_token("token", &["old"]));
    let verifier = SessionVerifier::new(backend.clone());
    let session = verifier.verify("token").await.unwrap().into_session();
    let store = Arc::new(PermissionStore::new(backend.clone()));

    let gate = backend.hold_fetches();
    let loader = {
        let store = Arc::clone(&store);
        let session = session.clone();
        tokio::spawn(async move { store.load_permissions(&session).await })
    };
    wait_for_fetches(&backend, 1).await;

    store.invalidate();
    backend.set_permissions("token", &["new"]);
    gate.release();

    // The session is still verified and current, so the load is not an error.
    let permissions = loader.await.unwrap().unwrap();
    assert!(permissions.contains("new"));
    assert!(!permissions.contains("old"));
    assert_eq!(store.has("new"), Ok(true));
    assert_eq!(backend.fetch_calls(), 2);
}

#[tokio::test]
async fn test_failed_shared_fetch_is_not_repeated_per_waiter() {
    let backend = Arc::new(MockAuthBackend::new().with_token("token", &["users.manage"]));
    let verifier = SessionVerifier::new(backend.clone());
    let session = verifier.verify("token").await.unwrap().into_session();
    let store = Arc::new(PermissionStore::new(backend.clone()));

    backend.set_unavailable(true);
    backend.hold_fetches();
    let mut handles = Vec::new();
    for _ in 0..3 {
        let store = Arc::clone(&store);
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            store.load_permissions(&session).await
        }));
    }
    wait_for_fetches(&backend, 1).await;
    backend.release_fetches();

    for handle in handles {
        assert!(matches!(handle.await.unwrap(), Err(GateError::Unavailable(_))));
    }
    assert_eq!(backend.fetch_calls(), 1);
}
