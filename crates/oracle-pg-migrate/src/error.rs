//! Error types for the migration library.

use thiserror::Error;

/// PostgreSQL SQLSTATE codes that mean "the object is already there".
///
/// 42P06 duplicate_schema, 42P07 duplicate_table (also raised for indexes),
/// 42710 duplicate_object (named constraints, sequences),
/// 42P16 invalid_table_definition (second ADD PRIMARY KEY).
const ALREADY_EXISTS_SQLSTATES: &[&str] = &["42P06", "42P07", "42710", "42P16"];

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, bad identifier).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A catalog query against the source database failed.
    #[error("Metadata read failed for schema {schema}: {message}")]
    MetadataRead { schema: String, message: String },

    /// A catalog row could not be turned into a usable descriptor.
    #[error("Invalid metadata for {object}: {message}")]
    InvalidMetadata { object: String, message: String },

    /// A row value could not be represented as a `SqlValue`.
    #[error("Unsupported value type in column {column}: {message}")]
    UnsupportedValueType { column: String, message: String },

    /// The target database rejected a DDL/DML statement.
    #[error("Statement failed ({}): {message}\n  Statement: {statement}", .code.as_deref().unwrap_or("no SQLSTATE"))]
    Statement {
        statement: String,
        code: Option<String>,
        message: String,
    },

    /// Source connection error outside of a specific catalog query.
    #[error("Source database error: {0}")]
    Source(String),

    /// Target connection or pool error.
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// Connection pool error with context.
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// IO error (file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Migration was cancelled (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred.
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a MetadataRead error.
    pub fn metadata_read(schema: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::MetadataRead {
            schema: schema.into(),
            message: message.to_string(),
        }
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(object: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::InvalidMetadata {
            object: object.into(),
            message: message.into(),
        }
    }

    /// Create a Statement error.
    pub fn statement(
        statement: impl Into<String>,
        code: Option<String>,
        message: impl ToString,
    ) -> Self {
        MigrateError::Statement {
            statement: statement.into(),
            code,
            message: message.to_string(),
        }
    }

    /// Whether this error means the target object already exists.
    ///
    /// Re-running a migration replays constraint-adding statements that are
    /// not idempotent; the orchestrator tolerates exactly this class of
    /// failure and nothing else.
    pub fn is_already_exists(&self) -> bool {
        match self {
            MigrateError::Statement { code, message, .. } => {
                code.as_deref()
                    .is_some_and(|c| ALREADY_EXISTS_SQLSTATES.contains(&c))
                    || message.contains("already exists")
            }
            _ => false,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_by_sqlstate() {
        let err = MigrateError::statement(
            "ALTER TABLE hr.employees ADD PRIMARY KEY (id)",
            Some("42P16".to_string()),
            "multiple primary keys for table \"employees\" are not allowed",
        );
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_already_exists_by_message() {
        let err =
            MigrateError::statement("CREATE SCHEMA hr", None, "schema \"hr\" already exists");
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_other_statement_error_is_not_tolerated() {
        let err = MigrateError::statement(
            "INSERT INTO hr.employees (id) VALUES (1)",
            Some("23505".to_string()),
            "duplicate key value violates unique constraint",
        );
        assert!(!err.is_already_exists());
    }

    #[test]
    fn test_non_statement_errors_never_match() {
        assert!(!MigrateError::Cancelled.is_already_exists());
        assert!(!MigrateError::Config("already exists".into()).is_already_exists());
    }
}
