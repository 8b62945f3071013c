use super::AuthBackend;
use crate::error::{GateError, GateResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

/// Handle on one batch of parked permission fetches.
#[derive(Debug, Clone)]
pub struct FetchGate {
    gate: Arc<Semaphore>,
}

impl FetchGate {
    /// Lets every fetch parked on this gate complete.
    pub fn release(&self) {
        // Closing wakes every parked fetch.
        self.gate.close();
    }
}

/// In-memory [`AuthBackend`] for tests.
///
/// Known tokens verify and return their configured permissions; unknown tokens
/// are rejected. A fetch answers with the permissions configured when it was
/// issued. Fetches can be parked with [`hold_fetches`](Self::hold_fetches)
/// to observe in-flight behaviour.
#[derive(Debug, Default)]
pub struct MockAuthBackend {
    tokens: Mutex<HashMap<String, Vec<String>>>,
    unavailable: AtomicBool,
    verify_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    fetch_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a valid token with its granted permissions.
    pub fn with_token(self, token: &str, permissions: &[&str]) -> Self {
        self.set_permissions(token, permissions);
        self
    }

    pub fn set_permissions(&self, token: &str, permissions: &[&str]) {
        let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        tokens.insert(
            token.to_string(),
            permissions.iter().map(|p| p.to_string()).collect(),
        );
    }

    /// While set, every call fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Parks every subsequent permission fetch until the returned gate is
    /// released or [`release_fetches`](Self::release_fetches) is called.
    ///
    /// Holding again starts a new batch; fetches already parked stay on the
    /// gate they were issued under.
    pub fn hold_fetches(&self) -> FetchGate {
        let gate = Arc::new(Semaphore::new(0));
        let mut current = self.fetch_gate.lock().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::clone(&gate));
        FetchGate { gate }
    }

    /// Releases the current batch and stops parking new fetches.
    pub fn release_fetches(&self) {
        let gate = self
            .fetch_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(gate) = gate {
            gate.close();
        }
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> GateResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GateError::Unavailable("mock backend is unavailable".to_string()));
        }
        Ok(())
    }

    fn permissions_for(&self, token: &str) -> Option<Vec<String>> {
        let tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        tokens.get(token).cloned()
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn verify_token(&self, token: &str) -> GateResult<()> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        match self.permissions_for(token) {
            Some(_) => Ok(()),
            None => Err(GateError::Unauthenticated("token rejected".to_string())),
        }
    }

    async fn fetch_permissions(&self, token: &str) -> GateResult<Vec<String>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let granted = self.permissions_for(token);

        let gate = self
            .fetch_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            // Resolves once the gate is closed.
            let _ = gate.acquire().await;
        }

        self.check_available()?;
        granted.ok_or_else(|| GateError::Unauthenticated("token rejected".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_verifies_known_tokens() {
        let backend = MockAuthBackend::new().with_token("good", &["users.manage"]);

        assert!(backend.verify_token("good").await.is_ok());
        assert!(matches!(
            backend.verify_token("bad").await,
            Err(GateError::Unauthenticated(_))
        ));
        assert_eq!(backend.verify_calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_answers_with_permissions_at_issue_time() {
        let backend = Arc::new(MockAuthBackend::new().with_token("good", &["old"]));
        let gate = backend.hold_fetches();

        let parked = {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { backend.fetch_permissions("good").await })
        };
        while backend.fetch_calls() < 1 {
            tokio::task::yield_now().await;
        }

        backend.set_permissions("good", &["new"]);
        gate.release();
        assert_eq!(parked.await.unwrap(), Ok(vec!["old".to_string()]));
        assert_eq!(
            backend.fetch_permissions("good").await,
            Ok(vec!["new".to_string()])
        );
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let backend = MockAuthBackend::new().with_token("good", &[]);
        backend.set_unavailable(true);

        assert!(matches!(
            backend.fetch_permissions("good").await,
            Err(GateError::Unavailable(_))
        ));
    }
}
