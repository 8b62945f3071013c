use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The permission names granted to one session.
///
/// Unordered and unique. The store replaces it as a whole; it is never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    permissions: HashSet<String>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Permission names in lexical order, for display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.iter().collect();
        names.sort_unstable();
        names
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            permissions: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse() {
        let set: PermissionSet = vec!["users.manage", "users.manage", "settings.view"]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("users.manage"));
        assert!(!set.contains("billing.view"));
        assert_eq!(set.sorted(), vec!["settings.view", "users.manage"]);
    }

    #[test]
    fn test_deserializes_from_json_array() {
        let set: PermissionSet = serde_json::from_str(r#"["a","b","a"]"#).unwrap();
        assert_eq!(set.len(), 2);
    }
}
