//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_YAML: &str = r#"
source:
  sid: XEPDB1
  user: system
  password: oracle
target:
  database: warehouse
  user: postgres
  password: postgres
migration:
  schemas: [HR]
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = Config::from_yaml(MINIMAL_YAML).unwrap();
        assert_eq!(config.source.host, "127.0.0.1");
        assert_eq!(config.source.port, 1521);
        assert_eq!(config.source.mode, SessionMode::Sysdba);
        assert_eq!(config.target.port, 5432);
        assert_eq!(config.migration.insert_batch_size, 500);
        assert_eq!(config.migration.stream_batch_size, 5000);
        assert!(config.migration.create_indexes);
        assert!(config.migration.create_foreign_keys);
        assert!(config.migration.stage_triggers);
        assert!(!config.migration.show_sql);
    }

    #[test]
    fn test_schemas_are_required() {
        let yaml = MINIMAL_YAML.replace("schemas: [HR]", "schemas: []");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_schema_names_are_validated() {
        let yaml = MINIMAL_YAML.replace("schemas: [HR]", "schemas: [\"HR; DROP\"]");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let yaml = format!("{MINIMAL_YAML}  insert_batch_size: 0\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_session_mode_parses_lowercase() {
        let yaml = MINIMAL_YAML.replace("  user: system", "  user: system\n  mode: normal");
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.source.mode, SessionMode::Normal);
    }
}
