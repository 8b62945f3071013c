//! Session verification
//!
//! A [`Session`] carries a token and its verification state; the
//! [`SessionVerifier`] is the only component that moves it through
//! `Unverified -> Verifying -> Verified | Invalid`.

pub mod retry;
pub mod state;
pub mod verifier;

pub use retry::{retry_unavailable, RetryPolicy};
pub use state::{Session, VerificationState, VerifiedSession};
pub use verifier::{SessionVerifier, VerificationResult};
