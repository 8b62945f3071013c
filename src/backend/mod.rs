//! Backend access for token verification and permission listing
//!
//! The core never talks to the network directly; it goes through
//! [`AuthBackend`], which has an HTTP implementation and, behind the `mock`
//! feature, an in-memory one for tests.

pub mod http_client;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

use crate::error::GateResult;
use async_trait::async_trait;
use std::fmt::Debug;

pub use http_client::{BackendHttpClient, HttpAuthBackend, HttpClientBuilder};
#[cfg(any(test, feature = "mock"))]
pub use mock::{FetchGate, MockAuthBackend};

#[async_trait]
pub trait AuthBackend: Send + Sync + Debug {
    /// Verifies a token with the backend.
    ///
    /// Must fail with `Unauthenticated` when the token is rejected and with
    /// `Unavailable` on transport or endpoint failures. Implementations must
    /// not retry.
    async fn verify_token(&self, token: &str) -> GateResult<()>;

    /// Returns every permission name granted to the session owning `token`.
    async fn fetch_permissions(&self, token: &str) -> GateResult<Vec<String>>;
}
