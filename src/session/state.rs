use crate::error::{GateError, GateResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Verification state of a [`Session`].
///
/// ```text
/// Unverified --verify--> Verifying --success--> Verified --logout/expiry--> Invalid
///                                  \--failure--> Invalid
/// ```
///
/// `Invalid` is terminal. A new token gets a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationState {
    Unverified,
    Verifying,
    Verified,
    Invalid,
}

impl VerificationState {
    pub fn can_transition_to(self, next: VerificationState) -> bool {
        use VerificationState::*;
        matches!(
            (self, next),
            (Unverified, Verifying) | (Verifying, Verified) | (Verifying, Invalid) | (Verified, Invalid)
        )
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unverified => write!(f, "Unverified"),
            Self::Verifying => write!(f, "Verifying"),
            Self::Verified => write!(f, "Verified"),
            Self::Invalid => write!(f, "Invalid"),
        }
    }
}

struct SessionInner {
    id: Uuid,
    token: String,
    state: RwLock<VerificationState>,
}

impl fmt::Debug for SessionInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The token is a credential; keep it out of logs.
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .field("state", &*self.state.read().unwrap_or_else(PoisonError::into_inner))
            .finish()
    }
}

/// One user's runtime context, identified by a token.
///
/// Cloning is cheap and every clone observes the same state, so the verifier,
/// the permission store and the caller stay in agreement.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Creates an `Unverified` session. Empty or whitespace-only tokens are rejected.
    pub fn new(token: impl Into<String>) -> GateResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(GateError::InvalidArgument(
                "Session token cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                token,
                state: RwLock::new(VerificationState::Unverified),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn token(&self) -> &str {
        &self.inner.token
    }

    pub fn state(&self) -> VerificationState {
        *self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_verified(&self) -> bool {
        self.state() == VerificationState::Verified
    }

    /// Whether both handles refer to the same session instance.
    pub fn same_as(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Ends the session (logout or token expiry). Idempotent.
    pub fn invalidate(&self) {
        let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state != VerificationState::Invalid {
            debug!("Session {}: {} -> Invalid (invalidated)", self.inner.id, *state);
            *state = VerificationState::Invalid;
        }
    }

    pub(crate) fn transition(&self, next: VerificationState) -> GateResult<()> {
        let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.can_transition_to(next) {
            return Err(GateError::PreconditionFailed(format!(
                "Session {} cannot move from {} to {}",
                self.inner.id, *state, next
            )));
        }
        debug!("Session {}: {} -> {}", self.inner.id, *state, next);
        *state = next;
        Ok(())
    }
}

impl AsRef<Session> for Session {
    fn as_ref(&self) -> &Session {
        self
    }
}

/// Marker for a session that passed verification.
///
/// Holding one does not guarantee the session is *still* verified; consumers
/// re-check the live state.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    session: Session,
}

impl VerifiedSession {
    pub(crate) fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}

impl AsRef<Session> for VerifiedSession {
    fn as_ref(&self) -> &Session {
        &self.session
    }
}
