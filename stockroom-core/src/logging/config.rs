//! Logger settings

use super::LogFormat;
use crate::config::LoggingSection;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Log levels in order of severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Trace => LogLevel::Trace,
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level \"{}\"", other)),
        }
    }
}

/// Stream log lines are written to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogTarget {
    #[default]
    Stdout,
    /// Keeps stdout free for command output
    Stderr,
}

/// Logger settings
#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub target: LogTarget,
    /// Fields added to every entry
    pub context_fields: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Human,
            target: LogTarget::Stdout,
            context_fields: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// JSON lines at info
    pub fn production() -> Self {
        Self { format: LogFormat::Json, ..Self::default() }
    }

    /// Human-readable lines at debug
    pub fn development() -> Self {
        Self { level: LogLevel::Debug, ..Self::default() }
    }

    /// Settings from the `[logging]` config section; unknown values keep the defaults
    pub fn from_section(section: &LoggingSection) -> Self {
        let defaults = Self::default();
        Self {
            level: section.level.parse().unwrap_or(defaults.level),
            format: section.format.parse().unwrap_or(defaults.format),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_context_field(mut self, key: &str, value: &str) -> Self {
        self.context_fields.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_section() {
        let section = LoggingSection { level: "debug".into(), format: "logfmt".into() };
        let config = LoggingConfig::from_section(&section);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Logfmt);
    }

    #[test]
    fn test_level_ordering_matches_log_crate() {
        assert!(LogLevel::Error < LogLevel::Trace);
        assert_eq!(log::LevelFilter::from(LogLevel::Warn), log::LevelFilter::Warn);
    }
}
