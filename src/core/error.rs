//! Error types for the agent core.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Lifecycle phase a failure or timeout is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// First stage: `Plugin::init`
    Init,
    /// Second stage: `PostInit::after_init`
    AfterInit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => write!(f, "Init"),
            Phase::AfterInit => write!(f, "AfterInit"),
        }
    }
}

/// A single plugin that failed to release its resources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseFailure {
    /// Plugin name
    pub plugin: String,
    /// Rendered cause
    pub cause: String,
}

impl ReleaseFailure {
    /// Create a new failure record.
    pub fn new(plugin: &str, cause: impl fmt::Display) -> Self {
        Self {
            plugin: plugin.to_string(),
            cause: cause.to_string(),
        }
    }
}

impl fmt::Display for ReleaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.plugin, self.cause)
    }
}

/// Render a list of release failures as `a: x; b: y`.
pub fn join_failures(failures: &[ReleaseFailure]) -> String {
    failures
        .iter()
        .map(ReleaseFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn recovery_suffix(label: &str, failures: &[ReleaseFailure]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(" ({} failed: {})", label, join_failures(failures))
    }
}

/// Errors that can occur while driving the plugin lifecycle.
#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "plugin {plugin}: Init error '{cause}', took {elapsed:?}{}",
        recovery_suffix("rollback", .rollback)
    )]
    Init {
        plugin: String,
        cause: String,
        elapsed: Duration,
        rollback: Vec<ReleaseFailure>,
    },

    #[error(
        "plugin {plugin}: AfterInit error '{cause}', took {elapsed:?}{}",
        recovery_suffix("teardown", .teardown)
    )]
    AfterInit {
        plugin: String,
        cause: String,
        elapsed: Duration,
        teardown: Vec<ReleaseFailure>,
    },

    #[error("plugin {plugin} not completed before timeout ({phase} exceeded {limit:?})")]
    Timeout {
        plugin: String,
        phase: Phase,
        limit: Duration,
    },

    #[error("{}", join_failures(.0))]
    Teardown(Vec<ReleaseFailure>),

    #[error("Duplicate plugin name: {0}")]
    DuplicatePlugin(String),

    #[error("Agent has already been started")]
    AlreadyStarted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Startup pipeline aborted after timeout")]
    PipelineAborted,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Name of the plugin the error is attributed to, if any.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Error::Init { plugin, .. }
            | Error::AfterInit { plugin, .. }
            | Error::Timeout { plugin, .. } => Some(plugin.as_str()),
            Error::DuplicatePlugin(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Whether this is a startup deadline error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
