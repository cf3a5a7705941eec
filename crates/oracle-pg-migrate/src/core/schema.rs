//! Schema descriptors for tables, columns, constraints, indexes, sequences
//! and triggers.
//!
//! These are read-only snapshots of one catalog object each, produced by the
//! metadata reader and consumed once by the generator/orchestrator. Nothing
//! here is mutated after construction.

use serde::{Deserialize, Serialize};

/// Table metadata: owner schema, name, and ordered column definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Owning schema (source-folded form).
    pub schema: String,

    /// Table name.
    pub name: String,

    /// Column definitions in catalog order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Source data type name (e.g. "NUMBER", "VARCHAR2").
    pub data_type: String,

    /// Declared character length for string types.
    pub char_length: Option<u32>,

    /// Whether the column allows NULL.
    pub nullable: bool,
}

/// Primary key constraint: participating columns in ordinal position order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKey {
    /// Owning schema.
    pub schema: String,

    /// Owning table.
    pub table: String,

    /// Column names ordered by the constraint's ordinal position.
    pub columns: Vec<String>,
}

/// Unique constraint: named, with columns in ordinal position order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueKey {
    /// Constraint name from the source catalog.
    pub name: String,

    /// Owning schema.
    pub schema: String,

    /// Owning table.
    pub table: String,

    /// Column names ordered by the constraint's ordinal position.
    pub columns: Vec<String>,
}

/// Foreign key: one referencing column and the referenced
/// schema.table.column triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Owning schema.
    pub schema: String,

    /// Referencing table.
    pub table: String,

    /// Referencing column.
    pub column: String,

    /// Referenced schema.
    pub ref_schema: String,

    /// Referenced table.
    pub ref_table: String,

    /// Referenced column.
    pub ref_column: String,
}

/// Index metadata. The source catalog yields one row per indexed column, so
/// a multi-column index appears as repeated entries under one name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Indexed table.
    pub table: String,

    /// Indexed column.
    pub column: String,
}

/// Sequence metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: String,

    /// Current value (Oracle `last_number`), used as the target START value.
    pub last_number: i64,

    /// Declared minimum bound.
    pub min_value: i64,

    /// Declared maximum bound, possibly wider than the target can represent.
    /// Clamped at DDL generation, not here.
    pub max_value: u64,
}

/// Trigger metadata. Translated to statement text for staging only; the
/// procedural body is never executed on the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger name.
    pub name: String,

    /// Triggering event (INSERT, UPDATE, DELETE).
    pub event: String,

    /// Table the trigger fires on.
    pub table: String,

    /// Procedural body, verbatim from the source.
    pub body: String,
}
