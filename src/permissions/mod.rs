// permissions module

pub mod permission_store;
pub mod types;
pub use permission_store::PermissionStore;
pub use types::{PermissionRegistry, PermissionSet};
