//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Validation engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Evaluate focus nodes on the rayon pool
    pub parallel: bool,
    /// Size of a dedicated pool; the global pool when unset
    pub worker_threads: Option<usize>,
    /// Upper bound on rule fixpoint iterations
    pub max_rule_iterations: usize,
    /// Re-run rules until no new triple is inferred
    pub iterate_rules: bool,
    /// Drop non-IRI nodes returned by target functions
    pub targets_iri_only: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            worker_threads: None,
            max_rule_iterations: 100,
            iterate_rules: false,
            targets_iri_only: true,
        }
    }
}

impl EngineConfig {
    /// Single-threaded evaluation
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Parse from YAML text
    pub fn from_yaml(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let config = Self::from_yaml(&std::fs::read_to_string(path)?)?;
        info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_rule_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "max_rule_iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::Invalid {
                field: "worker_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.parallel);
        assert_eq!(config.max_rule_iterations, 100);
        assert!(config.targets_iri_only);
        assert!(!config.iterate_rules);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml("iterate_rules: true\nworker_threads: 2\n").unwrap();
        assert!(config.iterate_rules);
        assert_eq!(config.worker_threads, Some(2));
        assert_eq!(config.max_rule_iterations, 100);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::from_yaml("max_rule_iterations: 0"),
            Err(ConfigError::Invalid { field: "max_rule_iterations", .. })
        ));
        assert!(matches!(
            EngineConfig::from_yaml("parallel: maybe"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        let config = EngineConfig {
            parallel: false,
            ..EngineConfig::default()
        };
        std::fs::write(&path, config.to_yaml().unwrap()).unwrap();
        assert_eq!(EngineConfig::from_file(&path).unwrap(), config);
    }
}
