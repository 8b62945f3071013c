//! Permission-gated navigation
//!
//! Navigation entries and settings tabs are static, configuration-supplied
//! lists. This module only decides which of them a permission set may see.

pub mod config;
pub mod filter;
pub mod types;

pub use config::NavigationConfig;
pub use filter::{filter, is_visible};
pub use types::{Gated, NavEntry, TabItem};
