//! Logging setup
//!
//! The library logs through the `log` facade only. Binaries call [`init`] once
//! to install `env_logger`; `RUST_LOG` still overrides the configured level.

pub mod config;

pub use config::LoggingSettings;

use crate::error::{GateError, GateResult};
use env_logger::Builder;

/// Installs the global logger. Calling it again is a no-op.
pub fn init(settings: &LoggingSettings) -> GateResult<()> {
    let level = settings.level_filter().map_err(GateError::InvalidArgument)?;

    let mut builder = Builder::new();
    builder.filter_level(level).parse_default_env();
    if settings.timestamps {
        builder.format_timestamp_millis();
    } else {
        builder.format_timestamp(None);
    }

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
    Ok(())
}
