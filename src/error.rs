use thiserror::Error;

/// Unified error type for session, permission and wizard operations.
///
/// Each variant maps to one failure class callers must handle differently:
/// network-classified errors (`Unauthenticated`, `Unavailable`) go to the UI,
/// misuse errors (`InvalidArgument`, `PreconditionFailed`) indicate a bug at
/// the call site.
///
/// Field validation failures are never carried here; they are returned as a
/// [`FieldErrors`](crate::utils::validation::FieldErrors) mapping instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Malformed caller input (empty token, unknown step index, unregistered field)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend explicitly rejected the token
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Transport or endpoint failure; safe to retry at the caller's discretion
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Operation invoked on a session in the wrong state
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Permission lookup before the first successful fetch resolved
    #[error("Not ready: {0}")]
    NotReady(String),
}

impl GateError {
    /// Whether a caller may retry the failed operation.
    ///
    /// Only transport failures qualify; a rejected token never does.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Whether the user has to sign in again.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }
}

/// Result type alias for operations that can result in a GateError
pub type GateResult<T> = Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(GateError::Unavailable("timeout".into()).is_retryable());
        assert!(!GateError::Unauthenticated("rejected".into()).is_retryable());
        assert!(!GateError::NotReady("loading".into()).is_retryable());

        assert!(GateError::Unauthenticated("rejected".into()).requires_reauth());
        assert!(!GateError::Unavailable("timeout".into()).requires_reauth());
    }

    #[test]
    fn test_display_messages() {
        let err = GateError::PreconditionFailed("session is Invalid".into());
        assert_eq!(err.to_string(), "Precondition failed: session is Invalid");
    }
}
