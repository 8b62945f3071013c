//! Configuration module for the console gate
//!
//! This module provides the TOML configuration file structures: backend
//! location, logging, the permission registry and the static navigation lists.

pub mod error;
pub mod gate_config;

pub use error::{ConfigError, ConfigResult};
pub use gate_config::{BackendConfig, GateConfig, PermissionsConfig};
