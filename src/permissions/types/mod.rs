pub mod permission_set;
pub mod registry;

pub use permission_set::PermissionSet;
pub use registry::PermissionRegistry;
