//! Target database collaborator: a statement execution interface.
//!
//! The core emits SQL text only; an implementation of [`TargetDb`] executes
//! each statement within its own commit boundary (autocommit-per-statement),
//! so the overall migration is deliberately not atomic.

pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;

pub use postgres::PgTarget;

/// Execute DDL/DML statements against the target database.
///
/// A failed statement surfaces as [`MigrateError::Statement`] carrying the
/// dialect's native error code and message; no result rows are consumed.
///
/// [`MigrateError::Statement`]: crate::error::MigrateError::Statement
#[async_trait]
pub trait TargetDb: Send + Sync {
    /// Execute one statement and commit it.
    async fn execute(&self, sql: &str) -> Result<()>;
}
