//! Logging for Stockroom
//!
//! A `log` facade backend: library code uses the standard macros
//! (`log::info!`, `log::warn!`, ...) and the binary installs this logger once
//! at startup.
//!
//! ```rust,no_run
//! use stockroom_core::logging::{init_logging, LoggingConfig, LogTarget};
//!
//! init_logging(&LoggingConfig::production().with_target(LogTarget::Stderr)).unwrap();
//! log::info!("Coordinator ready");
//! ```

pub mod config;
pub mod formatter;

pub use config::{LogLevel, LogTarget, LoggingConfig};
pub use formatter::{LogEntry, LogFormat};

use serde_json::Value;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the Stockroom logger
///
/// Only the first call takes effect; later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = log::set_boxed_logger(Box::new(StockroomLogger::new(config.clone())))
            .map(|()| log::set_max_level(config.level.into()))
            .map_err(anyhow::Error::from);
    });
    result
}

struct StockroomLogger {
    config: LoggingConfig,
}

impl StockroomLogger {
    fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    fn entry(&self, record: &log::Record) -> LogEntry {
        let mut entry =
            LogEntry::new(record.level().into(), record.args().to_string(), record.target());
        for (key, value) in &self.config.context_fields {
            entry.fields.insert(key.clone(), Value::String(value.clone()));
        }
        entry
    }
}

impl log::Log for StockroomLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        LogLevel::from(metadata.level()) <= self.config.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.config.format.format_entry(&self.entry(record));
        match self.config.target {
            LogTarget::Stdout => println!("{}", line),
            LogTarget::Stderr => eprintln!("{}", line),
        }
    }

    fn flush(&self) {
        let _ = match self.config.target {
            LogTarget::Stdout => std::io::stdout().flush(),
            LogTarget::Stderr => std::io::stderr().flush(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn test_level_filter() {
        let logger = StockroomLogger::new(LoggingConfig::default().with_level(LogLevel::Warn));
        let warn = log::Metadata::builder().level(log::Level::Warn).build();
        let debug = log::Metadata::builder().level(log::Level::Debug).build();

        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn test_context_fields_are_attached() {
        let logger = StockroomLogger::new(
            LoggingConfig::default().with_context_field("app", "stockroom"),
        );
        let entry = logger.entry(
            &log::Record::builder()
                .args(format_args!("Signed in"))
                .level(log::Level::Info)
                .target("stockroom_core::session")
                .build(),
        );

        assert_eq!(entry.message, "Signed in");
        assert_eq!(entry.fields["app"], "stockroom");
    }
}
