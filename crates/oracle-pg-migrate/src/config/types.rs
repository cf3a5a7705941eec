//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (Oracle).
    pub source: SourceConfig,

    /// Target database configuration (PostgreSQL).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    pub migration: MigrationConfig,
}

/// Oracle session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Connect as a normal user.
    Normal,

    /// Connect AS SYSDBA (required for the dba_* catalog views).
    #[default]
    Sysdba,
}

/// Source database (Oracle) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 1521).
    #[serde(default = "default_oracle_port")]
    pub port: u16,

    /// Instance identifier (SID or service name).
    pub sid: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Session mode (default: sysdba).
    #[serde(default)]
    pub mode: SessionMode,
}

/// Target database (PostgreSQL) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Schemas to migrate, processed independently in the order given.
    pub schemas: Vec<String>,

    /// Rows per INSERT statement during data copy.
    #[serde(default = "default_insert_batch")]
    pub insert_batch_size: usize,

    /// Rows per streamed read batch from the source.
    #[serde(default = "default_stream_batch")]
    pub stream_batch_size: usize,

    /// Create indexes after data copy (default: true).
    #[serde(default = "default_true")]
    pub create_indexes: bool,

    /// Create foreign keys after all tables exist (default: true).
    #[serde(default = "default_true")]
    pub create_foreign_keys: bool,

    /// Generate trigger DDL for inspection. Never executed.
    #[serde(default = "default_true")]
    pub stage_triggers: bool,

    /// Log every statement before execution.
    #[serde(default)]
    pub show_sql: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_oracle_port() -> u16 {
    1521
}

fn default_pg_port() -> u16 {
    5432
}

fn default_insert_batch() -> usize {
    500
}

fn default_stream_batch() -> usize {
    5000
}

fn default_true() -> bool {
    true
}
