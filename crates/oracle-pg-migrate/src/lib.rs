//! # oracle-pg-migrate
//!
//! Oracle to PostgreSQL schema and data migration library.
//!
//! Reads catalog metadata (tables, columns, keys, indexes, sequences,
//! triggers) from an Oracle schema, translates it to PostgreSQL DDL, creates
//! the objects in dependency order, and copies row data with safe literal
//! serialization:
//!
//! - **Type mapping** from Oracle column types to PostgreSQL
//! - **Dependency ordering** - foreign keys only after every table exists
//! - **Idempotent DDL** so a partial migration can be re-run from the top
//! - **Streamed row copy** with multi-row INSERT batching
//! - **Staged trigger DDL** generated for inspection, never executed
//!
//! ## Example
//!
//! ```rust,no_run
//! use oracle_pg_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> oracle_pg_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::connect(config).await?;
//!     let report = orchestrator.run(None).await?;
//!     println!("{}", report.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod source;
pub mod target;
pub mod typemap;

// Re-exports for convenient access
pub use catalog::Catalog;
pub use config::{Config, MigrationConfig, SessionMode, SourceConfig, TargetConfig};
pub use crate::core::schema::{
    Column, ForeignKey, Index, PrimaryKey, Sequence, Table, Trigger, UniqueKey,
};
pub use crate::core::value::SqlValue;
pub use error::{MigrateError, Result};
pub use orchestrator::{MigrationReport, Orchestrator, SchemaReport};
pub use source::{OracleOdbc, Row, SourceDb};
pub use target::{PgTarget, TargetDb};
