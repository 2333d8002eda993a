//! Structured logging for the agent.
//!
//! The orchestrator logs through the `Logger` trait so that callers can
//! route lifecycle events anywhere. `TracingLogger` forwards to `tracing`,
//! `MemoryLogger` keeps a bounded buffer for inspection, `NoopLogger`
//! drops everything.

use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace = 0,
    /// Debug level
    Debug = 1,
    /// Info level
    Info = 2,
    /// Warning level
    Warn = 3,
    /// Error level
    Error = 4,
}

impl LogLevel {
    /// Matching `tracing` level.
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A structured log entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp
    pub timestamp: Timestamp,
    /// Log level
    pub level: LogLevel,
    /// Message
    pub message: String,
    /// Target (module path)
    pub target: String,
    /// Structured fields
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: now(),
            level,
            message: message.into(),
            target: String::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Set target.
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Add a field.
    pub fn with_field(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.to_string(), v);
        }
        self
    }

    /// Get a field.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as text.
    pub fn to_text(&self) -> String {
        let fields_str = if self.fields.is_empty() {
            String::new()
        } else {
            format!(" {}", fields_json(&self.fields))
        };

        format!(
            "{} {} [{}] {}{}",
            self.timestamp, self.level, self.target, self.message, fields_str
        )
    }
}

fn fields_json(fields: &BTreeMap<String, serde_json::Value>) -> String {
    serde_json::to_string(fields).unwrap_or_default()
}

/// Sink for structured lifecycle events.
pub trait Logger: Send + Sync {
    /// Log an entry.
    fn log(&self, entry: LogEntry);
}

/// Forwards entries to the `tracing` ecosystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, entry: LogEntry) {
        let fields = fields_json(&entry.fields);
        let module = entry.target.as_str();
        match entry.level {
            LogLevel::Trace => tracing::trace!(module, fields = %fields, "{}", entry.message),
            LogLevel::Debug => tracing::debug!(module, fields = %fields, "{}", entry.message),
            LogLevel::Info => tracing::info!(module, fields = %fields, "{}", entry.message),
            LogLevel::Warn => tracing::warn!(module, fields = %fields, "{}", entry.message),
            LogLevel::Error => tracing::error!(module, fields = %fields, "{}", entry.message),
        }
    }
}

/// Drops every entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _entry: LogEntry) {}
}

/// Subscriber output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Default multi-field layout
    Full,
    /// Single-line compact layout
    Compact,
}

/// Logger configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Minimum log level
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Include event targets in output
    pub include_targets: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Full,
            include_targets: true,
        }
    }
}

/// Install a global `tracing-subscriber` fmt subscriber.
///
/// Returns `false` when a global subscriber is already installed.
pub fn init_tracing(config: &LoggerConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.level.as_tracing())
        .with_target(config.include_targets);

    let result = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    result.is_ok()
}

/// Level-filtered logger keeping the most recent entries in memory.
pub struct MemoryLogger {
    /// Minimum log level
    level: LogLevel,
    /// Log buffer
    buffer: RwLock<Vec<LogEntry>>,
    /// Maximum buffer size
    max_buffer: usize,
}

impl MemoryLogger {
    /// Create a new logger.
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            buffer: RwLock::new(Vec::new()),
            max_buffer: 1000,
        }
    }

    /// Set maximum buffer size.
    pub fn with_capacity(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer.max(1);
        self
    }

    /// Get buffered logs.
    pub fn get_logs(&self) -> Vec<LogEntry> {
        match self.buffer.read() {
            Ok(buffer) => buffer.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Get logs at or above a level.
    pub fn get_logs_at_level(&self, min_level: LogLevel) -> Vec<LogEntry> {
        self.get_logs()
            .into_iter()
            .filter(|e| e.level >= min_level)
            .collect()
    }

    /// Whether any buffered message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.get_logs().iter().any(|e| e.message.contains(needle))
    }

    /// Clear the buffer.
    pub fn clear(&self) {
        if let Ok(mut buffer) = self.buffer.write() {
            buffer.clear();
        }
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new(LogLevel::Trace)
    }
}

impl Logger for MemoryLogger {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.level {
            return;
        }

        let mut buffer = match self.buffer.write() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if buffer.len() >= self.max_buffer {
            buffer.remove(0);
        }
        buffer.push(entry);
    }
}
