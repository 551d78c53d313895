//! AsyncSearchConfig - サービスの既定値と上限
//!
//! JSON ファイルから読み込めます（欠けているフィールドは既定値）。
//!
//! ```json
//! { "node_id": "node-1", "default_keep_alive": "1h", "max_wait_for_completion_timeout": "30s" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DEFAULT_WAIT_FOR_COMPLETION_TIMEOUT, NodeId, TimeValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncSearchConfig {
    /// Node id embedded in every handle this service mints.
    pub node_id: NodeId,
    /// Retention applied on submit when the request has no keep_alive.
    pub default_keep_alive: TimeValue,
    /// Upper bound for any requested keep_alive.
    pub max_keep_alive: TimeValue,
    pub default_wait_for_completion_timeout: TimeValue,
    /// `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wait_for_completion_timeout: Option<TimeValue>,
}

impl Default for AsyncSearchConfig {
    fn default() -> Self {
        Self {
            node_id: NodeId::local(),
            default_keep_alive: TimeValue::from_days(5),
            max_keep_alive: TimeValue::from_days(5),
            default_wait_for_completion_timeout: DEFAULT_WAIT_FOR_COMPLETION_TIMEOUT,
            max_wait_for_completion_timeout: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl AsyncSearchConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// 起動時に全部まとめて検査する
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        if self.default_keep_alive.as_nanos() <= 0 {
            errors.push(format!(
                "default_keep_alive must be positive, got [{}]",
                self.default_keep_alive
            ));
        }
        if self.default_keep_alive.as_nanos() > self.max_keep_alive.as_nanos() {
            errors.push(format!(
                "default_keep_alive [{}] exceeds max_keep_alive [{}]",
                self.default_keep_alive, self.max_keep_alive
            ));
        }
        if self.default_wait_for_completion_timeout.is_negative() {
            errors.push(format!(
                "default_wait_for_completion_timeout must be non-negative, got [{}]",
                self.default_wait_for_completion_timeout
            ));
        }
        if let Some(max) = self.max_wait_for_completion_timeout {
            if max.is_negative() {
                errors.push(format!(
                    "max_wait_for_completion_timeout must be non-negative, got [{max}]"
                ));
            } else if self.default_wait_for_completion_timeout.as_nanos() > max.as_nanos() {
                errors.push(format!(
                    "default_wait_for_completion_timeout [{}] exceeds max_wait_for_completion_timeout [{max}]",
                    self.default_wait_for_completion_timeout
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        let config = AsyncSearchConfig::default();
        config.validate().unwrap();
        assert_eq!(config.node_id.as_str(), "local");
        assert_eq!(config.default_keep_alive.to_string(), "5d");
        assert_eq!(config.default_wait_for_completion_timeout.to_string(), "1s");
        assert!(config.max_wait_for_completion_timeout.is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = AsyncSearchConfig::from_json_str(
            r#"{"node_id": "node-7", "default_keep_alive": "1h", "max_wait_for_completion_timeout": "30s"}"#,
        )
        .unwrap();
        assert_eq!(config.node_id.as_str(), "node-7");
        assert_eq!(config.default_keep_alive.to_string(), "1h");
        assert_eq!(config.max_keep_alive, TimeValue::from_days(5));
        assert_eq!(
            config.max_wait_for_completion_timeout,
            Some(TimeValue::from_secs(30))
        );
    }

    #[rstest]
    #[case::bad_node(r#"{"node_id": "a.b"}"#)]
    #[case::bad_duration(r#"{"default_keep_alive": "soon"}"#)]
    #[case::not_json("node_id = 1")]
    fn parse_errors(#[case] raw: &str) {
        assert!(matches!(
            AsyncSearchConfig::from_json_str(raw),
            Err(ConfigError::Parse(_))
        ));
    }

    #[rstest]
    #[case::zero_keep_alive(r#"{"default_keep_alive": "0"}"#)]
    #[case::default_above_max(r#"{"default_keep_alive": "6d"}"#)]
    #[case::wait_above_max(r#"{"default_wait_for_completion_timeout": "10s", "max_wait_for_completion_timeout": "5s"}"#)]
    #[case::negative_wait(r#"{"default_wait_for_completion_timeout": "-1"}"#)]
    fn invalid_values(#[case] raw: &str) {
        assert!(matches!(
            AsyncSearchConfig::from_json_str(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AsyncSearchConfig::from_json_file("/nonexistent/asearch.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
