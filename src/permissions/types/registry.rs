use crate::error::{GateError, GateResult};
use std::collections::BTreeSet;

/// Permission names a deployment knows about.
///
/// Navigation configuration is checked against the registry when it is loaded,
/// so a misspelled `required_permission` fails at startup instead of silently
/// hiding a tab. An empty registry disables the check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionRegistry {
    known: BTreeSet<String>,
}

impl PermissionRegistry {
    /// Builds a registry; names must be non-empty and free of whitespace.
    pub fn new<I, S>(names: I) -> GateResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut known = BTreeSet::new();
        for name in names {
            let name = name.into();
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(GateError::InvalidArgument(format!(
                    "Invalid permission name '{}'",
                    name
                )));
            }
            known.insert(name);
        }
        Ok(Self { known })
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// Checks a referenced permission name. Always passes on an empty registry.
    pub fn check(&self, name: &str) -> GateResult<()> {
        if self.is_empty() || self.contains(name) {
            return Ok(());
        }
        Err(GateError::InvalidArgument(format!(
            "Unknown permission '{}'",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_checks_names() {
        let registry = PermissionRegistry::new(["users.manage", "settings.view"]).unwrap();
        assert!(registry.contains("settings.view"));
        assert!(!registry.is_empty());
        assert!(registry.check("users.manage").is_ok());
        assert!(matches!(
            registry.check("user.manage"),
            Err(GateError::InvalidArgument(_))
        ));
        // The empty string is a name like any other and is not registered here.
        assert!(registry.check("").is_err());
    }

    #[test]
    fn test_empty_registry_accepts_everything() {
        let registry = PermissionRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.check("anything").is_ok());
        assert!(registry.check("").is_ok());
    }

    #[test]
    fn test_rejects_malformed_names() {
        assert!(PermissionRegistry::new([""]).is_err());
        assert!(PermissionRegistry::new(["users manage"]).is_err());
    }
}
