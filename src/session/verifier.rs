use super::state::{Session, VerificationState, VerifiedSession};
use crate::backend::AuthBackend;
use crate::error::{GateError, GateResult};
use log::{debug, error, info, warn};
use std::sync::{Arc, PoisonError, RwLock};

/// Outcome of a verification attempt.
pub type VerificationResult = GateResult<VerifiedSession>;

/// Drives sessions through verification against the backend.
///
/// The verifier also tracks the current session of its user context: each
/// [`verify`](Self::verify) call replaces it with a fresh instance and ends
/// the one it supersedes.
#[derive(Debug)]
pub struct SessionVerifier {
    backend: Arc<dyn AuthBackend>,
    current: RwLock<Option<Session>>,
}

impl SessionVerifier {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            current: RwLock::new(None),
        }
    }

    /// Verifies `token` as a brand new session.
    ///
    /// Issues exactly one backend request; no automatic retry.
    pub async fn verify(&self, token: &str) -> VerificationResult {
        let session = Session::new(token)?;

        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(session.clone());
        if let Some(previous) = previous {
            debug!("Session {} superseded by {}", previous.id(), session.id());
            previous.invalidate();
        }

        self.verify_session(&session).await
    }

    /// Verifies an existing `Unverified` session.
    pub async fn verify_session(&self, session: &Session) -> VerificationResult {
        session.transition(VerificationState::Verifying).map_err(|e| {
            error!("Refusing to verify session {}: {}", session.id(), e);
            e
        })?;

        match self.backend.verify_token(session.token()).await {
            Ok(()) => {
                session.transition(VerificationState::Verified).map_err(|_| {
                    let err = GateError::PreconditionFailed(format!(
                        "Session {} was invalidated while verification was in flight",
                        session.id()
                    ));
                    warn!("{}", err);
                    err
                })?;
                info!("Session {} verified", session.id());
                Ok(VerifiedSession::new(session.clone()))
            }
            Err(e) => {
                if let Err(transition_err) = session.transition(VerificationState::Invalid) {
                    // Already Invalid if the session was ended mid-flight.
                    debug!("{}", transition_err);
                }
                match &e {
                    GateError::Unauthenticated(_) => {
                        warn!("Session {} rejected: {}", session.id(), e)
                    }
                    _ => warn!("Session {} could not be verified: {}", session.id(), e),
                }
                Err(e)
            }
        }
    }

    /// The most recently created session, in whatever state it is in.
    pub fn current_session(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Logs the current session out.
    pub fn end_session(&self) {
        let current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = current {
            info!("Session {} ended", session.id());
            session.invalidate();
        }
    }
}
