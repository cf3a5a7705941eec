//! Source database collaborator: a read-only SQL execution interface.
//!
//! The migration core never talks to a driver directly; it is handed an
//! implementation of [`SourceDb`] (the real ODBC-backed one lives in
//! [`odbc`], tests inject mocks).

pub mod odbc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::value::SqlValue;
use crate::error::Result;

pub use odbc::OracleOdbc;

/// One row from the source: an ordered mapping from column name (case as
/// returned by the driver) to a dynamically-typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Build a row from parallel column/value vectors.
    ///
    /// Both sides must have the same length; rows are constructed by drivers
    /// and test fixtures, never mutated afterwards.
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column names in driver order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in driver order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Look up a value by column name, case-insensitively.
    ///
    /// Oracle folds unquoted column names to upper case while the core asks
    /// for them in lower case; case-insensitive lookup absorbs both.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .map(|i| &self.values[i])
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Read-only SQL execution against the source database.
///
/// Each call issues exactly one query; implementations do not cache results
/// across calls (catalog state may move between calls, and every result is
/// consumed immediately by the orchestrator).
#[async_trait]
pub trait SourceDb: Send + Sync {
    /// Execute a query and collect all rows.
    ///
    /// Used for catalog metadata, which is small. Row data goes through
    /// [`stream`](SourceDb::stream) instead.
    async fn query(&self, sql: &str) -> Result<Vec<Row>>;

    /// Execute a query and stream rows in batches of at most `batch_size`.
    ///
    /// The receiver yields `Ok` batches until the result set is exhausted.
    /// A row whose values cannot be represented is sent as its own
    /// `Err(UnsupportedValueType)` message and streaming continues with the
    /// rows after it; any other error closes the channel. Rows are never
    /// buffered beyond one in-flight batch per side of the channel.
    fn stream(&self, sql: String, batch_size: usize) -> mpsc::Receiver<Result<Vec<Row>>>;
}
