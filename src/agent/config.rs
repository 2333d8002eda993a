//! Agent configuration.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default startup budget.
pub const DEFAULT_MAX_STARTUP: Duration = Duration::from_secs(15);

/// Startup/shutdown configuration of an agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Time limit for both initialization phases together
    #[serde(rename = "max_startup_ms", with = "duration_ms")]
    pub max_startup: Duration,
    /// Stop the background pipeline between plugins once the deadline fires
    pub cancel_on_timeout: bool,
}

impl AgentConfig {
    /// Create a config with the given startup budget.
    pub fn new(max_startup: Duration) -> Self {
        Self {
            max_startup,
            ..Default::default()
        }
    }

    /// Abort the pipeline on timeout instead of letting it run detached.
    pub fn with_cancel_on_timeout(mut self, cancel: bool) -> Self {
        self.cancel_on_timeout = cancel;
        self
    }

    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AgentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks.
    pub fn validate(&self) -> Result<()> {
        if self.max_startup.is_zero() {
            return Err(Error::InvalidConfig(
                "max_startup_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_startup: DEFAULT_MAX_STARTUP,
            cancel_on_timeout: false,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.max_startup, Duration::from_secs(15));
        assert!(!config.cancel_on_timeout);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config =
            AgentConfig::from_json(r#"{"max_startup_ms": 2500, "cancel_on_timeout": true}"#)
                .unwrap();
        assert_eq!(config.max_startup, Duration::from_millis(2500));
        assert!(config.cancel_on_timeout);
    }

    #[test]
    fn test_from_json_defaults_missing_fields() {
        let config = AgentConfig::from_json("{}").unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let err = AgentConfig::from_json(r#"{"max_startup_ms": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = AgentConfig::from_json(r#"{"max_startup_ms": "soon"}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_serialize_uses_millis() {
        let json = serde_json::to_string(&AgentConfig::new(Duration::from_secs(3))).unwrap();
        assert!(json.contains(r#""max_startup_ms":3000"#));
    }
}
