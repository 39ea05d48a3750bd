//! Log line formatting

use super::LogLevel;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// A structured log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Module path of the call site
    pub target: String,
    /// Context fields attached to every entry
    pub fields: BTreeMap<String, Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            target: target.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }
}

/// How log lines are rendered
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// `{"timestamp":"...","level":"INFO","target":"...","message":"..."}`
    Json,
    /// `2024-01-15 10:30:00.000 INFO  [stockroom_core::coordinator] Fetching languages`
    #[default]
    Human,
    /// `timestamp=... level=INFO target=... message="..."`
    Logfmt,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "human" | "text" => Ok(LogFormat::Human),
            "logfmt" => Ok(LogFormat::Logfmt),
            other => Err(format!("unknown log format \"{}\"", other)),
        }
    }
}

impl LogFormat {
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self {
            LogFormat::Json => format_json(entry),
            LogFormat::Human => format_human(entry),
            LogFormat::Logfmt => format_logfmt(entry),
        }
    }
}

fn level_name(level: LogLevel) -> String {
    format!("{:?}", level).to_uppercase()
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_json(entry: &LogEntry) -> String {
    let mut json = serde_json::Map::new();
    json.insert("timestamp".to_string(), Value::String(entry.timestamp.to_rfc3339()));
    json.insert("level".to_string(), Value::String(level_name(entry.level)));
    json.insert("target".to_string(), Value::String(entry.target.clone()));
    json.insert("message".to_string(), Value::String(entry.message.clone()));
    for (key, value) in &entry.fields {
        json.insert(key.clone(), value.clone());
    }
    serde_json::to_string(&json).unwrap_or_else(|_| "Failed to serialize log entry".to_string())
}

fn format_human(entry: &LogEntry) -> String {
    let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
    let mut line = format!(
        "{} {:5} [{}] {}",
        timestamp,
        level_name(entry.level),
        entry.target,
        entry.message
    );
    for (key, value) in &entry.fields {
        line.push_str(&format!(" {}={}", key, plain(value)));
    }
    line
}

fn format_logfmt(entry: &LogEntry) -> String {
    let quote = |s: &str| format!("\"{}\"", s.replace('"', "\\\""));
    let mut parts = vec![
        format!("timestamp={}", entry.timestamp.to_rfc3339()),
        format!("level={}", level_name(entry.level)),
        format!("target={}", entry.target),
        format!("message={}", quote(&entry.message)),
    ];
    for (key, value) in &entry.fields {
        let rendered = match value {
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => quote(&plain(other)),
        };
        parts.push(format!("{}={}", key, rendered));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_format() {
        let entry = LogEntry::new(LogLevel::Info, "Fetching languages", "stockroom_core::coordinator");

        let parsed: Value = serde_json::from_str(&LogFormat::Json.format_entry(&entry)).unwrap();

        assert_eq!(parsed["message"], "Fetching languages");
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["target"], "stockroom_core::coordinator");
    }

    #[test]
    fn test_human_format() {
        let entry = LogEntry::new(LogLevel::Warn, "Session expired", "stockroom_core::session")
            .with_field("app", Value::String("stockroom".into()));

        let formatted = LogFormat::Human.format_entry(&entry);

        assert!(formatted.contains("WARN"));
        assert!(formatted.contains("[stockroom_core::session] Session expired"));
        assert!(formatted.ends_with("app=stockroom"));
    }

    #[test]
    fn test_logfmt_escapes_quotes() {
        let entry = LogEntry::new(LogLevel::Error, "bad \"value\"", "app");

        let formatted = LogFormat::Logfmt.format_entry(&entry);

        assert!(formatted.contains("level=ERROR"));
        assert!(formatted.contains("message=\"bad \\\"value\\\"\""));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
