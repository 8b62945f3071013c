use super::types::Gated;
use crate::permissions::PermissionSet;

/// Whether a single entry is visible with `permissions`.
pub fn is_visible<T: Gated + ?Sized>(entry: &T, permissions: &PermissionSet) -> bool {
    match entry.required_permission() {
        None => true,
        Some(required) => permissions.contains(required),
    }
}

/// Returns the entries visible with `permissions`, in their original order.
///
/// Pure and idempotent: filtering an already-filtered list with the same set
/// returns it unchanged.
pub fn filter<T: Gated + Clone>(entries: &[T], permissions: &PermissionSet) -> Vec<T> {
    entries
        .iter()
        .filter(|entry| is_visible(*entry, permissions))
        .cloned()
        .collect()
}
