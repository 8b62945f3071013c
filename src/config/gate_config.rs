use super::error::{ConfigError, ConfigResult};
use crate::constants::{BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::logging::LoggingSettings;
use crate::navigation::NavigationConfig;
use crate::permissions::PermissionRegistry;
use log::debug;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `[backend]` section: where the auth and permission endpoints live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL the endpoint paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// `[permissions]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsConfig {
    /// Known permission names. Empty disables checking navigation references.
    #[serde(default)]
    pub known: Vec<String>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub permissions: PermissionsConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

impl GateConfig {
    /// Parses and validates a TOML document. Environment overrides are not applied.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: GateConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file, applies environment overrides and validates.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let contents = fs::read_to_string(path)?;
        let mut config: GateConfig = toml::from_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if given, else the default location if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(default_path) if default_path.exists() => Self::load(&default_path),
            _ => {
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// `<config dir>/console_gate/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("console_gate").join("config.toml"))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary lookup (the process environment in production).
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!("{} overrides backend.base_url", BASE_URL_ENV);
            self.backend.base_url = base_url;
        }
    }

    pub fn registry(&self) -> ConfigResult<PermissionRegistry> {
        PermissionRegistry::new(self.permissions.known.iter().cloned())
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let url = Url::parse(&self.backend.base_url).map_err(|e| {
            ConfigError::Validation(format!("backend.base_url '{}': {}", self.backend.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "backend.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "backend.timeout_secs must be at least 1".to_string(),
            ));
        }

        self.logging.level_filter().map_err(ConfigError::Validation)?;

        let registry = self.registry()?;
        self.navigation
            .validate(&registry)
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
