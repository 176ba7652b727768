use serde::Deserialize;

use crate::error::EngineError;

/// Engine configuration — parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Path of the on-disk fallback file (newline-delimited JSON).
    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,

    /// Path of the SQL file used to provision the store schema at bootstrap.
    #[serde(default = "default_schema_path")]
    pub schema_path: String,

    /// Tick interval of the file drain worker.
    #[serde(default = "default_file_drain_interval_ms")]
    pub file_drain_interval_ms: u64,

    /// Tick interval of the queue drain worker.
    #[serde(default = "default_queue_drain_interval_ms")]
    pub queue_drain_interval_ms: u64,
}

fn default_fallback_path() -> String {
    "granary-fallback.jsonl".into()
}
fn default_schema_path() -> String {
    "sql/schema.sql".into()
}
fn default_file_drain_interval_ms() -> u64 {
    1000
}
fn default_queue_drain_interval_ms() -> u64 {
    5000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_path: default_fallback_path(),
            schema_path: default_schema_path(),
            file_drain_interval_ms: default_file_drain_interval_ms(),
            queue_drain_interval_ms: default_queue_drain_interval_ms(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the workers cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.fallback_path.is_empty() {
            return Err(EngineError::Config("fallback_path must not be empty".into()));
        }
        if self.schema_path.is_empty() {
            return Err(EngineError::Config("schema_path must not be empty".into()));
        }
        if self.file_drain_interval_ms == 0 {
            return Err(EngineError::Config("file_drain_interval_ms must be > 0".into()));
        }
        if self.queue_drain_interval_ms == 0 {
            return Err(EngineError::Config("queue_drain_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_takes_defaults() {
        let config = EngineConfig::parse("").unwrap();
        assert_eq!(config.fallback_path, "granary-fallback.jsonl");
        assert_eq!(config.schema_path, "sql/schema.sql");
        assert_eq!(config.file_drain_interval_ms, 1000);
        assert_eq!(config.queue_drain_interval_ms, 5000);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = EngineConfig::parse(
            r#"
            fallback_path = "/var/lib/granary/fallback.jsonl"
            file_drain_interval_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.fallback_path, "/var/lib/granary/fallback.jsonl");
        assert_eq!(config.file_drain_interval_ms, 250);
        assert_eq!(config.queue_drain_interval_ms, 5000);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = EngineConfig::parse("queue_drain_interval_ms = 0").unwrap_err();
        assert!(err.to_string().contains("queue_drain_interval_ms"));
    }

    #[test]
    fn empty_fallback_path_is_rejected() {
        assert!(EngineConfig::parse(r#"fallback_path = """#).is_err());
    }
}
