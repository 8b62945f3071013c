use super::types::{Gated, NavEntry, TabItem};
use crate::error::{GateError, GateResult};
use crate::permissions::PermissionRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Static navigation and settings-tab lists supplied by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default)]
    pub entries: Vec<NavEntry>,
    #[serde(default)]
    pub tabs: Vec<TabItem>,
}

impl NavigationConfig {
    /// Rejects duplicate tab ids and permission names the registry does not know.
    pub fn validate(&self, registry: &PermissionRegistry) -> GateResult<()> {
        let mut tab_ids = HashSet::new();
        for tab in &self.tabs {
            if !tab_ids.insert(tab.id.as_str()) {
                return Err(GateError::InvalidArgument(format!(
                    "Duplicate settings tab id '{}'",
                    tab.id
                )));
            }
        }

        let entry_refs = self
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.required_permission()));
        let tab_refs = self
            .tabs
            .iter()
            .map(|t| (t.id.as_str(), t.required_permission()));

        for (owner, required) in entry_refs.chain(tab_refs) {
            if let Some(required) = required {
                registry.check(required).map_err(|_| {
                    GateError::InvalidArgument(format!(
                        "'{}' requires unknown permission '{}'",
                        owner, required
                    ))
                })?;
            }
        }
        Ok(())
    }
}
