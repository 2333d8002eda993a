//! Monitoring Module
//!
//! Provides observability for the agent:
//! - Structured logging sinks
//! - Subscriber setup

pub mod logging;

pub use logging::{
    init_tracing, LogEntry, LogFormat, LogLevel, Logger, LoggerConfig, MemoryLogger, NoopLogger,
    TracingLogger,
};
