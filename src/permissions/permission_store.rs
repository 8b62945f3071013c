use crate::backend::AuthBackend;
use crate::error::{GateError, GateResult};
use crate::navigation::{filter, Gated};
use crate::permissions::types::PermissionSet;
use crate::session::Session;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type PermissionFetch = Shared<BoxFuture<'static, GateResult<Arc<PermissionSet>>>>;

enum LoadStep {
    Cached(Arc<PermissionSet>),
    /// A fetch and the epoch of the binding it belongs to.
    Await(PermissionFetch, u64),
}

/// How a finished fetch relates to the store's current state.
enum FetchCompletion {
    /// The fetch was the binding's own; its result stands.
    Current(GateResult<Arc<PermissionSet>>),
    /// Orphaned by invalidation while in flight; the caller loads again.
    Superseded,
}

/// Cache state bound to one session.
struct Binding {
    session: Session,
    /// Distinct for every binding the store creates.
    epoch: u64,
    permissions: Option<Arc<PermissionSet>>,
    inflight: Option<PermissionFetch>,
}

/// Fetches and caches the permission set of the active session.
///
/// The store implements the session-scoped permission cache:
/// - at most one backend fetch per verified session, with concurrent loaders
///   sharing the in-flight request and receiving the same `Arc`
/// - synchronous membership queries against the cached set
/// - full clear when the bound session leaves `Verified` or on
///   [`invalidate`](Self::invalidate)
///
/// A fetch that completes after its session was invalidated or replaced is
/// discarded rather than cached.
pub struct PermissionStore {
    backend: Arc<dyn AuthBackend>,
    state: Mutex<Option<Binding>>,
    next_epoch: AtomicU64,
}

impl PermissionStore {
    /// Creates a store that fetches through `backend`.
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(None),
            next_epoch: AtomicU64::new(0),
        }
    }

    /// Loads the permission set for `session`, fetching it at most once.
    ///
    /// # Errors
    ///
    /// * `PreconditionFailed` if the session is not `Verified`, or stops being
    ///   `Verified` or bound before the fetch completes
    ///
    /// A fetch orphaned by [`invalidate`](Self::invalidate) is not an error: its
    /// result is dropped and the load continues with a fresh fetch.
    /// * `Unauthenticated` / `Unavailable` from the backend
    pub async fn load_permissions<S: AsRef<Session>>(
        &self,
        session: S,
    ) -> GateResult<Arc<PermissionSet>> {
        let session = session.as_ref();
        if !session.is_verified() {
            let err = GateError::PreconditionFailed(format!(
                "Cannot load permissions for session {} in state {}",
                session.id(),
                session.state()
            ));
            error!("{}", err);
            return Err(err);
        }

        loop {
            let (fetch, epoch) = match self.begin_load(session) {
                LoadStep::Cached(permissions) => return Ok(permissions),
                LoadStep::Await(fetch, epoch) => (fetch, epoch),
            };

            let result = fetch.clone().await;
            match self.complete_fetch(session, &fetch, epoch, result)? {
                FetchCompletion::Current(result) => return result,
                FetchCompletion::Superseded => {
                    debug!(
                        "Permission fetch for session {} was superseded; reloading",
                        session.id()
                    );
                }
            }
        }
    }

    /// Synchronous membership check against the cached set.
    ///
    /// Fails with `NotReady` until a load for the current session has resolved.
    pub fn has(&self, permission: &str) -> GateResult<bool> {
        Ok(self.permissions()?.contains(permission))
    }

    /// Snapshot of the cached set.
    pub fn permissions(&self) -> GateResult<Arc<PermissionSet>> {
        let mut state = self.lock_state();
        Self::drop_stale(&mut state);
        state
            .as_ref()
            .and_then(|binding| binding.permissions.clone())
            .ok_or_else(|| {
                GateError::NotReady("Permissions have not been loaded for the current session".to_string())
            })
    }

    /// Filters gated entries with the current session's permissions.
    pub fn visible<T: Gated + Clone>(&self, entries: &[T]) -> GateResult<Vec<T>> {
        let permissions = self.permissions()?;
        Ok(filter(entries, &permissions))
    }

    pub fn is_loaded(&self) -> bool {
        self.permissions().is_ok()
    }

    /// The session the cache is currently bound to, if any.
    pub fn bound_session(&self) -> Option<Session> {
        let mut state = self.lock_state();
        Self::drop_stale(&mut state);
        state.as_ref().map(|binding| binding.session.clone())
    }

    /// Clears the cache; the next load fetches again.
    pub fn invalidate(&self) {
        let mut state = self.lock_state();
        if let Some(binding) = state.take() {
            info!("Permission cache cleared for session {}", binding.session.id());
        }
    }

    /// Returns the cached set or the fetch to wait on, starting one if needed.
    fn begin_load(&self, session: &Session) -> LoadStep {
        let mut state = self.lock_state();
        match state.as_mut() {
            Some(binding) if binding.session.same_as(session) => {
                if let Some(permissions) = &binding.permissions {
                    return LoadStep::Cached(Arc::clone(permissions));
                }
                match &binding.inflight {
                    Some(fetch) => {
                        debug!("Joining in-flight permission fetch for session {}", session.id());
                        LoadStep::Await(fetch.clone(), binding.epoch)
                    }
                    None => {
                        let fetch = self.start_fetch(session);
                        binding.inflight = Some(fetch.clone());
                        LoadStep::Await(fetch, binding.epoch)
                    }
                }
            }
            _ => {
                if let Some(previous) = state.as_ref() {
                    debug!(
                        "Rebinding permission store from session {} to {}",
                        previous.session.id(),
                        session.id()
                    );
                }
                let fetch = self.start_fetch(session);
                let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
                *state = Some(Binding {
                    session: session.clone(),
                    epoch,
                    permissions: None,
                    inflight: Some(fetch.clone()),
                });
                LoadStep::Await(fetch, epoch)
            }
        }
    }

    fn start_fetch(&self, session: &Session) -> PermissionFetch {
        let backend = Arc::clone(&self.backend);
        let token = session.token().to_string();
        let session_id = session.id();

        async move {
            debug!("Fetching permissions for session {}", session_id);
            let names = backend.fetch_permissions(&token).await?;
            Ok(Arc::new(names.into_iter().collect::<PermissionSet>()))
        }
        .boxed()
        .shared()
    }

    /// Settles a finished fetch against the current binding.
    ///
    /// Only the binding's own in-flight fetch may populate the cache. A fetch
    /// orphaned by [`invalidate`](Self::invalidate) is dropped untouched.
    fn complete_fetch(
        &self,
        session: &Session,
        fetch: &PermissionFetch,
        epoch: u64,
        result: GateResult<Arc<PermissionSet>>,
    ) -> GateResult<FetchCompletion> {
        let mut state = self.lock_state();
        Self::drop_stale(&mut state);

        // Checked at completion, not only at initiation.
        if !session.is_verified() {
            let err = GateError::PreconditionFailed(format!(
                "Session {} is {}; discarding fetched permissions",
                session.id(),
                session.state()
            ));
            warn!("{}", err);
            return Err(err);
        }

        let binding = match state.as_mut() {
            None => return Ok(FetchCompletion::Superseded),
            Some(binding) if binding.session.same_as(session) => {
                if binding.epoch != epoch {
                    return Ok(FetchCompletion::Superseded);
                }
                binding
            }
            Some(binding) => {
                let err = GateError::PreconditionFailed(format!(
                    "Permission store was rebound to session {}; discarding permissions for {}",
                    binding.session.id(),
                    session.id()
                ));
                warn!("{}", err);
                return Err(err);
            }
        };

        // The first waiter settles the binding; the others share its result.
        let settles = binding
            .inflight
            .as_ref()
            .is_some_and(|inflight| inflight.ptr_eq(fetch));
        if !settles {
            return Ok(FetchCompletion::Current(result));
        }
        binding.inflight = None;

        match result {
            Ok(fetched) => {
                binding.permissions = Some(Arc::clone(&fetched));
                info!(
                    "Loaded {} permissions for session {}",
                    fetched.len(),
                    session.id()
                );
                Ok(FetchCompletion::Current(Ok(fetched)))
            }
            Err(e) => {
                warn!("Permission fetch for session {} failed: {}", session.id(), e);
                Ok(FetchCompletion::Current(Err(e)))
            }
        }
    }

    /// Clears a binding whose session has left `Verified`.
    fn drop_stale(state: &mut Option<Binding>) {
        let stale = state
            .as_ref()
            .is_some_and(|binding| !binding.session.is_verified());
        if stale {
            if let Some(binding) = state.take() {
                info!(
                    "Session {} is {}; clearing permission cache",
                    binding.session.id(),
                    binding.session.state()
                );
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<Binding>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockAuthBackend;
    use crate::session::SessionVerifier;

    async fn verified_setup(
        permissions: &[&str],
    ) -> (Arc<MockAuthBackend>, PermissionStore, Session) {
        let backend = Arc::new(MockAuthBackend::new().with_token("token", permissions));
        let verifier = SessionVerifier::new(backend.clone());
        let session = verifier.verify("token").await.unwrap().into_session();
        let store = PermissionStore::new(backend.clone());
        (backend, store, session)
    }

    #[tokio::test]
    async fn test_has_before_load_is_not_ready() {
        let (_, store, _) = verified_setup(&["users.manage"]).await;
        assert!(matches!(store.has("users.manage"), Err(GateError::NotReady(_))));
    }

    #[tokio::test]
    async fn test_load_then_has() {
        let (backend, store, session) = verified_setup(&["users.manage"]).await;

        let permissions = store.load_permissions(&session).await.unwrap();
        assert!(permissions.contains("users.manage"));
        assert_eq!(store.has("users.manage"), Ok(true));
        assert_eq!(store.has("billing.view"), Ok(false));

        // Cached: a second load does not fetch again.
        let again = store.load_permissions(&session).await.unwrap();
        assert!(Arc::ptr_eq(&permissions, &again));
        assert_eq!(backend.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_unverified_session_precondition() {
        let backend = Arc::new(MockAuthBackend::new());
        let store = PermissionStore::new(backend.clone());
        let session = Session::new("token").unwrap();

        assert!(matches!(
            store.load_permissions(&session).await,
            Err(GateError::PreconditionFailed(_))
        ));
        assert_eq!(backend.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalidation_clears_cache() {
        let (backend, store, session) = verified_setup(&["users.manage"]).await;
        store.load_permissions(&session).await.unwrap();

        store.invalidate();
        assert!(matches!(store.has("users.manage"), Err(GateError::NotReady(_))));

        store.load_permissions(&session).await.unwrap();
        assert_eq!(backend.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn test_session_logout_clears_cache() {
        let (_, store, session) = verified_setup(&["users.manage"]).await;
        store.load_permissions(&session).await.unwrap();

        session.invalidate();
        assert!(matches!(store.has("users.manage"), Err(GateError::NotReady(_))));
        assert!(store.bound_session().is_none());
        assert!(matches!(
            store.load_permissions(&session).await,
            Err(GateError::PreconditionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_fetch_can_be_retried() {
        let (backend, store, session) = verified_setup(&["users.manage"]).await;
        backend.set_unavailable(true);
        assert!(matches!(
            store.load_permissions(&session).await,
            Err(GateError::Unavailable(_))
        ));
        assert!(!store.is_loaded());

        backend.set_unavailable(false);
        assert!(store.load_permissions(&session).await.is_ok());
        assert_eq!(backend.fetch_calls(), 2);
    }
}
