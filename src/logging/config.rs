//! Logging configuration

use crate::constants::DEFAULT_LOG_LEVEL;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// `[logging]` section of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default log level (`error`, `warn`, `info`, `debug`, `trace`, `off`)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Include millisecond timestamps in console output
    #[serde(default = "default_timestamps")]
    pub timestamps: bool,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_timestamps() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_timestamps(),
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> Result<LevelFilter, String> {
        LevelFilter::from_str(&self.level).map_err(|_| format!("Invalid log level '{}'", self.level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_parsing() {
        let settings = LoggingSettings::default();
        assert_eq!(settings.level_filter(), Ok(LevelFilter::Info));

        let settings = LoggingSettings {
            level: "DEBUG".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.level_filter(), Ok(LevelFilter::Debug));

        let settings = LoggingSettings {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(settings.level_filter().is_err());
    }
}
