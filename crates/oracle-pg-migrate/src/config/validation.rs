//! Configuration validation.

use crate::core::identifier::validate_identifier;
use crate::error::{MigrateError, Result};

use super::Config;

/// Validate a loaded configuration before any connection is opened.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.host.is_empty() {
        return Err(MigrateError::Config("source.host cannot be empty".into()));
    }
    if config.source.sid.is_empty() {
        return Err(MigrateError::Config("source.sid cannot be empty".into()));
    }
    if config.source.user.is_empty() {
        return Err(MigrateError::Config("source.user cannot be empty".into()));
    }

    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host cannot be empty".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config(
            "target.database cannot be empty".into(),
        ));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user cannot be empty".into()));
    }

    if config.migration.schemas.is_empty() {
        return Err(MigrateError::Config(
            "migration.schemas must name at least one schema".into(),
        ));
    }
    for schema in &config.migration.schemas {
        validate_identifier(schema)
            .map_err(|e| MigrateError::Config(format!("migration.schemas: {e}")))?;
    }

    if config.migration.insert_batch_size == 0 {
        return Err(MigrateError::Config(
            "migration.insert_batch_size must be at least 1".into(),
        ));
    }
    if config.migration.stream_batch_size == 0 {
        return Err(MigrateError::Config(
            "migration.stream_batch_size must be at least 1".into(),
        ));
    }

    Ok(())
}
