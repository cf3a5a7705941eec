//! PostgreSQL DDL/DML builders.
//!
//! One pure function per object kind, descriptor in, statement text out.
//! Object-creation statements carry `IF NOT EXISTS` so a partially completed
//! migration can be re-run from the top; constraint additions cannot be
//! guarded that way and rely on the orchestrator tolerating "already exists"
//! failures on re-run.

use crate::core::identifier::{qualify_pg, quote_pg, validate_identifier};
use crate::core::schema::{ForeignKey, Index, PrimaryKey, Sequence, Table, Trigger, UniqueKey};
use crate::core::value::SqlValue;
use crate::error::{MigrateError, Result};
use crate::source::Row;
use crate::typemap::oracle_to_postgres;

/// Build a CREATE SCHEMA statement.
pub fn create_schema(schema: &str) -> Result<String> {
    Ok(format!("CREATE SCHEMA IF NOT EXISTS {}", quote_pg(schema)?))
}

/// Build a CREATE TABLE statement.
///
/// Each column renders as `name type [NOT NULL]`; types go through the type
/// mapper, so a bad column descriptor fails the whole table here rather than
/// at execution time.
pub fn create_table(table: &Table) -> Result<String> {
    let mut col_defs = Vec::with_capacity(table.columns.len());
    for col in &table.columns {
        let target_type = oracle_to_postgres(&col.data_type, col.char_length)?;
        let null_clause = if col.nullable { "" } else { " NOT NULL" };
        col_defs.push(format!(
            "{} {}{}",
            quote_pg(&col.name)?,
            target_type,
            null_clause
        ));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        qualify_pg(&table.schema, &table.name)?,
        col_defs.join(",\n    ")
    ))
}

/// Build an ADD PRIMARY KEY statement. Not idempotent.
pub fn add_primary_key(pk: &PrimaryKey) -> Result<String> {
    let cols = quote_column_list(&pk.columns)?;
    Ok(format!(
        "ALTER TABLE {} ADD PRIMARY KEY ({})",
        qualify_pg(&pk.schema, &pk.table)?,
        cols
    ))
}

/// Build an ADD CONSTRAINT ... UNIQUE statement. Not idempotent.
pub fn add_unique(uk: &UniqueKey) -> Result<String> {
    let cols = quote_column_list(&uk.columns)?;
    Ok(format!(
        "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
        qualify_pg(&uk.schema, &uk.table)?,
        quote_pg(&uk.name)?,
        cols
    ))
}

/// Build an ADD FOREIGN KEY statement. Not idempotent.
pub fn add_foreign_key(fk: &ForeignKey) -> Result<String> {
    Ok(format!(
        "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {} ({})",
        qualify_pg(&fk.schema, &fk.table)?,
        quote_pg(&fk.column)?,
        qualify_pg(&fk.ref_schema, &fk.ref_table)?,
        quote_pg(&fk.ref_column)?,
    ))
}

/// Build a CREATE SEQUENCE statement.
///
/// The source's declared maximum may exceed what the target can represent;
/// it is clamped to `i64::MAX` so the statement never overflows on create.
pub fn create_sequence(schema: &str, seq: &Sequence) -> Result<String> {
    let max_value = i64::try_from(seq.max_value).unwrap_or(i64::MAX);
    Ok(format!(
        "CREATE SEQUENCE IF NOT EXISTS {}.{} MINVALUE {} MAXVALUE {} START {}",
        quote_pg(schema)?,
        quote_pg(&seq.name)?,
        seq.min_value,
        max_value,
        seq.last_number
    ))
}

/// Build a CREATE INDEX statement.
pub fn create_index(schema: &str, idx: &Index) -> Result<String> {
    Ok(format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
        quote_pg(&idx.name)?,
        qualify_pg(schema, &idx.table)?,
        quote_pg(&idx.column)?,
    ))
}

/// Build one multi-row INSERT for a batch of rows.
///
/// Column names come from the first row; every row in a batch reads from the
/// same SELECT and therefore shares a column set. Values are rendered as
/// literals by the serializer.
pub fn insert_rows(schema: &str, table: &str, rows: &[Row]) -> Result<String> {
    let first = rows.first().ok_or_else(|| {
        MigrateError::invalid_metadata(table.to_string(), "empty row batch for insert")
    })?;

    let mut cols = Vec::with_capacity(first.len());
    for name in first.columns() {
        cols.push(quote_pg(name)?);
    }

    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != first.len() {
            return Err(MigrateError::invalid_metadata(
                table.to_string(),
                "rows in a batch must share a column set",
            ));
        }
        let values: Vec<String> = row.values().iter().map(SqlValue::pg_literal).collect();
        tuples.push(format!("({})", values.join(", ")));
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES {}",
        qualify_pg(schema, table)?,
        cols.join(", "),
        tuples.join(", ")
    ))
}

/// Build the trigger translation stub.
///
/// The statement text is produced for staging/inspection only — procedural
/// bodies are not portable across dialects and the orchestrator never
/// executes this.
pub fn create_trigger(schema: &str, trg: &Trigger) -> Result<String> {
    validate_identifier(&trg.name)?;
    let name = quote_pg(&trg.name)?;
    Ok(format!(
        "CREATE FUNCTION {name}() RETURNS trigger AS $trigger_body$ {} $trigger_body$ LANGUAGE plpgsql; \
         CREATE TRIGGER {name} BEFORE {} ON {} FOR EACH ROW EXECUTE PROCEDURE {name}()",
        trg.body,
        trg.event,
        qualify_pg(schema, &trg.table)?,
    ))
}

fn quote_column_list(columns: &[String]) -> Result<String> {
    let quoted: Result<Vec<String>> = columns.iter().map(|c| quote_pg(c)).collect();
    Ok(quoted?.join(", "))
}
