//! Common types used across the agent core.

use serde::{Deserialize, Serialize};

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Build metadata reported in the startup log line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Crate version
    pub version: String,
    /// Build date, set through `AGENT_BUILD_DATE` at compile time
    pub date: String,
}

impl BuildInfo {
    /// Metadata of the current build.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            date: option_env!("AGENT_BUILD_DATE").unwrap_or("unknown").to_string(),
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}

/// Convert a duration to whole nanoseconds for log fields.
pub fn as_nanos(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_info() {
        let info = BuildInfo::current();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.date.is_empty());
    }

    #[test]
    fn test_as_nanos() {
        assert_eq!(as_nanos(Duration::from_micros(3)), 3_000);
        assert_eq!(as_nanos(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_now_is_monotonic_enough() {
        let a = now();
        let b = now();
        assert!(b >= a);
    }
}
