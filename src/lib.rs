//! Session verification, permission-gated navigation and form wizards for
//! multi-app web consoles.
//!
//! The flow is: a [`SessionVerifier`] verifies a token, a [`PermissionStore`]
//! fetches and caches what that session may do, navigation lists are filtered
//! against the cached set, and [`WizardController`]s drive multi-step forms.

pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod permissions;
pub mod session;
pub mod utils;
pub mod wizard;

pub use backend::{AuthBackend, HttpAuthBackend};
#[cfg(any(test, feature = "mock"))]
pub use backend::MockAuthBackend;
pub use config::{ConfigError, GateConfig};
pub use error::{GateError, GateResult};
pub use navigation::{filter, Gated, NavEntry, NavigationConfig, TabItem};
pub use permissions::{PermissionRegistry, PermissionSet, PermissionStore};
pub use session::{Session, SessionVerifier, VerificationResult, VerificationState, VerifiedSession};
pub use utils::validation::{validate_field, FieldErrors, FieldRule, FieldValidator};
pub use wizard::{AdvanceOutcome, WizardController, WizardDefinition, WizardStep};
