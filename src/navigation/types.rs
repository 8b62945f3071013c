use serde::{Deserialize, Serialize};

/// Anything that may be hidden behind a permission.
pub trait Gated {
    /// The permission required to see this item.
    ///
    /// `None` means always visible. `Some("")` is a requirement for the empty
    /// string permission, not the absence of a requirement.
    fn required_permission(&self) -> Option<&str>;
}

/// A sidebar/top-level navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    pub name: String,
    pub href: String,
    pub icon: String,
    #[serde(alias = "activeIcon")]
    pub active_icon: String,
    #[serde(default, alias = "requiredPermission", skip_serializing_if = "Option::is_none")]
    pub required_permission: Option<String>,
}

impl NavEntry {
    pub fn new(name: &str, href: &str, icon: &str, active_icon: &str) -> Self {
        Self {
            name: name.to_string(),
            href: href.to_string(),
            icon: icon.to_string(),
            active_icon: active_icon.to_string(),
            required_permission: None,
        }
    }

    pub fn requiring(mut self, permission: &str) -> Self {
        self.required_permission = Some(permission.to_string());
        self
    }
}

impl Gated for NavEntry {
    fn required_permission(&self) -> Option<&str> {
        self.required_permission.as_deref()
    }
}

/// A settings tab. `alt` lists additional paths that mark the tab active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabItem {
    pub id: String,
    pub label: String,
    pub path: String,
    #[serde(default)]
    pub alt: Vec<String>,
    #[serde(default, alias = "requiredPermission", skip_serializing_if = "Option::is_none")]
    pub required_permission: Option<String>,
}

impl TabItem {
    pub fn new(id: &str, label: &str, path: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            path: path.to_string(),
            alt: Vec::new(),
            required_permission: None,
        }
    }

    pub fn with_alt(mut self, alt: &[&str]) -> Self {
        self.alt = alt.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn requiring(mut self, permission: &str) -> Self {
        self.required_permission = Some(permission.to_string());
        self
    }

    /// Whether `path` selects this tab, either directly or through `alt`.
    pub fn matches_path(&self, path: &str) -> bool {
        self.path == path || self.alt.iter().any(|alt| alt == path)
    }
}

impl Gated for TabItem {
    fn required_permission(&self) -> Option<&str> {
        self.required_permission.as_deref()
    }
}
