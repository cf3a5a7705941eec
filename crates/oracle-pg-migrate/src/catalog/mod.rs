//! Metadata reader: typed catalog queries against the source database.
//!
//! One read operation per catalog concept, each issuing exactly one query
//! and parsing the attribute rows into descriptors. Nothing is cached across
//! calls — catalog state may move between calls, and every result is
//! consumed immediately by the orchestrator.
//!
//! Constraint queries order participating columns by the source-defined
//! ordinal position; that order is load-bearing for composite keys and is
//! carried verbatim into the generated DDL.

use crate::core::identifier::fold_oracle;
use crate::core::schema::{
    Column, ForeignKey, Index, PrimaryKey, Sequence, Table, Trigger, UniqueKey,
};
use crate::core::value::SqlValue;
use crate::error::{MigrateError, Result};
use crate::source::{Row, SourceDb};

/// Facade over the source collaborator exposing typed catalog reads.
pub struct Catalog<'a> {
    source: &'a dyn SourceDb,
}

impl<'a> Catalog<'a> {
    /// Wrap a source collaborator.
    pub fn new(source: &'a dyn SourceDb) -> Self {
        Self { source }
    }

    /// List table names in a schema, ordered by name.
    pub async fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        let owner = fold_oracle(schema)?;
        let sql = format!(
            "SELECT table_name FROM all_tables WHERE owner = '{owner}' ORDER BY table_name"
        );
        let rows = self.read(schema, &sql).await?;

        rows.iter()
            .map(|row| text_attr(row, "table_name", "table list"))
            .collect()
    }

    /// Read column definitions for one table, in catalog column order.
    pub async fn list_columns(&self, schema: &str, table: &str) -> Result<Table> {
        let owner = fold_oracle(schema)?;
        let table_name = fold_oracle(table)?;
        let sql = format!(
            "SELECT column_name, data_type, char_length, nullable \
             FROM all_tab_columns \
             WHERE owner = '{owner}' AND table_name = '{table_name}' \
             ORDER BY column_id"
        );
        let rows = self.read(schema, &sql).await?;

        let object = format!("{owner}.{table_name}");
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = text_attr(row, "column_name", &object)?;
            let data_type = text_attr(row, "data_type", &object)?;
            let char_length = row
                .get("char_length")
                .and_then(SqlValue::as_i64)
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0);
            // Oracle marks NOT NULL columns with nullable = 'N'
            let nullable = row.get("nullable").and_then(SqlValue::as_text) != Some("N");

            columns.push(Column {
                name,
                data_type,
                char_length,
                nullable,
            });
        }

        Ok(Table {
            schema: owner,
            name: table_name,
            columns,
        })
    }

    /// Read the primary key of one table, columns in ordinal position order.
    pub async fn list_primary_key(&self, schema: &str, table: &str) -> Result<Option<PrimaryKey>> {
        let rows = self.constraint_columns(schema, table, 'P').await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let object = format!("{schema}.{table} primary key");
        let columns = rows
            .iter()
            .map(|row| text_attr(row, "column_name", &object))
            .collect::<Result<Vec<String>>>()?;

        Ok(Some(PrimaryKey {
            schema: fold_oracle(schema)?,
            table: fold_oracle(table)?,
            columns,
        }))
    }

    /// Read all unique constraints of one table.
    ///
    /// The catalog yields one row per participating column; rows are grouped
    /// by constraint name with position order preserved within each group.
    pub async fn list_unique_keys(&self, schema: &str, table: &str) -> Result<Vec<UniqueKey>> {
        let rows = self.constraint_columns(schema, table, 'U').await?;
        let object = format!("{schema}.{table} unique keys");

        let mut keys: Vec<UniqueKey> = Vec::new();
        for row in &rows {
            let name = text_attr(row, "constraint_name", &object)?;
            let column = text_attr(row, "column_name", &object)?;
            match keys.iter_mut().find(|k| k.name == name) {
                Some(key) => key.columns.push(column),
                None => keys.push(UniqueKey {
                    name,
                    schema: fold_oracle(schema)?,
                    table: fold_oracle(table)?,
                    columns: vec![column],
                }),
            }
        }

        Ok(keys)
    }

    /// Read all foreign keys declared in a schema.
    pub async fn list_foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKey>> {
        let owner = fold_oracle(schema)?;
        let sql = format!(
            "SELECT a.table_name, a.column_name, c.owner, \
             c.r_owner, c_pk.table_name r_table_name, col.column_name r_column_name \
             FROM all_cons_columns a \
             JOIN all_constraints c ON a.owner = c.owner AND a.constraint_name = c.constraint_name \
             JOIN all_constraints c_pk ON c.r_owner = c_pk.owner AND c.r_constraint_name = c_pk.constraint_name \
             JOIN dba_cons_columns col ON c.r_owner = col.owner AND c_pk.constraint_name = col.constraint_name \
             WHERE c.constraint_type = 'R' AND a.owner = '{owner}'"
        );
        let rows = self.read(schema, &sql).await?;

        let object = format!("{owner} foreign keys");
        rows.iter()
            .map(|row| {
                Ok(ForeignKey {
                    schema: text_attr(row, "owner", &object)?,
                    table: text_attr(row, "table_name", &object)?,
                    column: text_attr(row, "column_name", &object)?,
                    ref_schema: text_attr(row, "r_owner", &object)?,
                    ref_table: text_attr(row, "r_table_name", &object)?,
                    ref_column: text_attr(row, "r_column_name", &object)?,
                })
            })
            .collect()
    }

    /// Read all indexed columns in a schema, one entry per (index, column).
    pub async fn list_indexes(&self, schema: &str) -> Result<Vec<Index>> {
        let owner = fold_oracle(schema)?;
        let sql = format!(
            "SELECT index_name, column_name, table_name \
             FROM dba_ind_columns WHERE table_owner = '{owner}'"
        );
        let rows = self.read(schema, &sql).await?;

        let object = format!("{owner} indexes");
        rows.iter()
            .map(|row| {
                Ok(Index {
                    name: text_attr(row, "index_name", &object)?,
                    table: text_attr(row, "table_name", &object)?,
                    column: text_attr(row, "column_name", &object)?,
                })
            })
            .collect()
    }

    /// Read all sequences in a schema.
    pub async fn list_sequences(&self, schema: &str) -> Result<Vec<Sequence>> {
        let owner = fold_oracle(schema)?;
        let sql = format!(
            "SELECT sequence_name, last_number, min_value, max_value \
             FROM dba_sequences WHERE sequence_owner = '{owner}'"
        );
        let rows = self.read(schema, &sql).await?;

        let object = format!("{owner} sequences");
        rows.iter()
            .map(|row| {
                let name = text_attr(row, "sequence_name", &object)?;
                let last_number = int_attr(row, "last_number", &object)?;
                let min_value = int_attr(row, "min_value", &object)?;
                // Oracle's default MAXVALUE is 10^28 - 1, far beyond u64;
                // saturate here and clamp to the target bound at generation.
                let max_value = row
                    .get("max_value")
                    .map(sequence_bound)
                    .unwrap_or(None)
                    .ok_or_else(|| {
                        MigrateError::invalid_metadata(&name, "unreadable sequence max_value")
                    })?;

                Ok(Sequence {
                    name,
                    last_number,
                    min_value,
                    max_value,
                })
            })
            .collect()
    }

    /// Read all triggers in a schema.
    pub async fn list_triggers(&self, schema: &str) -> Result<Vec<Trigger>> {
        let owner = fold_oracle(schema)?;
        let sql = format!(
            "SELECT trigger_name, triggering_event, table_name, trigger_body \
             FROM sys.dba_triggers WHERE owner = '{owner}'"
        );
        let rows = self.read(schema, &sql).await?;

        let object = format!("{owner} triggers");
        rows.iter()
            .map(|row| {
                Ok(Trigger {
                    name: text_attr(row, "trigger_name", &object)?,
                    event: text_attr(row, "triggering_event", &object)?,
                    table: text_attr(row, "table_name", &object)?,
                    body: text_attr(row, "trigger_body", &object)?,
                })
            })
            .collect()
    }

    /// SQL for reading all rows of one table, for use with
    /// [`SourceDb::stream`].
    pub fn row_data_sql(&self, schema: &str, table: &str) -> Result<String> {
        let owner = fold_oracle(schema)?;
        let table_name = fold_oracle(table)?;
        Ok(format!("SELECT * FROM {owner}.{table_name}"))
    }

    /// Constraint participating-column rows for one table and constraint
    /// type, ordered for grouping: constraint name first, ordinal position
    /// within it.
    async fn constraint_columns(
        &self,
        schema: &str,
        table: &str,
        constraint_type: char,
    ) -> Result<Vec<Row>> {
        let owner = fold_oracle(schema)?;
        let table_name = fold_oracle(table)?;
        let sql = format!(
            "SELECT cons.constraint_name, cols.table_name, cols.column_name, cols.position \
             FROM all_constraints cons, all_cons_columns cols \
             WHERE cols.table_name = '{table_name}' AND cols.owner = '{owner}' \
             AND cons.constraint_type = '{constraint_type}' \
             AND cons.constraint_name = cols.constraint_name \
             AND cons.owner = cols.owner \
             ORDER BY cols.constraint_name, cols.position"
        );
        self.read(schema, &sql).await
    }

    async fn read(&self, schema: &str, sql: &str) -> Result<Vec<Row>> {
        self.source
            .query(sql)
            .await
            .map_err(|e| MigrateError::metadata_read(schema, e))
    }
}

fn text_attr(row: &Row, name: &str, object: &str) -> Result<String> {
    row.get(name)
        .and_then(SqlValue::as_text)
        .map(str::to_string)
        .ok_or_else(|| {
            MigrateError::invalid_metadata(object, format!("missing attribute {name}"))
        })
}

fn int_attr(row: &Row, name: &str, object: &str) -> Result<i64> {
    row.get(name).and_then(SqlValue::as_i64).ok_or_else(|| {
        MigrateError::invalid_metadata(object, format!("missing numeric attribute {name}"))
    })
}

/// Read a sequence bound that may exceed every native integer width.
fn sequence_bound(value: &SqlValue) -> Option<u64> {
    match value {
        SqlValue::Int(v) => Some((*v).max(0) as u64),
        SqlValue::Float(v) if *v >= u64::MAX as f64 => Some(u64::MAX),
        SqlValue::Float(v) if *v >= 0.0 => Some(*v as u64),
        SqlValue::Text(s) => {
            let t = s.trim();
            match t.parse::<u64>() {
                Ok(v) => Some(v),
                // A well-formed number too wide to represent saturates
                Err(_) if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) => {
                    Some(u64::MAX)
                }
                Err(_) => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Canned-response source that records every query it receives.
    struct MockSource {
        queries: Mutex<Vec<String>>,
        rows: Vec<Row>,
    }

    impl MockSource {
        fn with_rows(rows: Vec<Row>) -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                rows,
            }
        }
    }

    #[async_trait]
    impl SourceDb for MockSource {
        async fn query(&self, sql: &str) -> Result<Vec<Row>> {
            self.queries.lock().unwrap().push(sql.to_string());
            Ok(self.rows.clone())
        }

        fn stream(&self, _sql: String, _batch_size: usize) -> mpsc::Receiver<Result<Vec<Row>>> {
            let (tx, rx) = mpsc::channel(1);
            let rows = self.rows.clone();
            tokio::spawn(async move {
                let _ = tx.send(Ok(rows)).await;
            });
            rx
        }
    }

    fn attr_row(pairs: &[(&str, SqlValue)]) -> Row {
        Row::new(
            pairs.iter().map(|(c, _)| c.to_string()).collect(),
            pairs.iter().map(|(_, v)| v.clone()).collect(),
        )
    }

    #[tokio::test]
    async fn test_list_tables_folds_schema_and_issues_one_query() {
        let source = MockSource::with_rows(vec![attr_row(&[(
            "TABLE_NAME",
            SqlValue::Text("DEPARTMENTS".into()),
        )])]);
        let catalog = Catalog::new(&source);

        let tables = catalog.list_tables("hr").await.unwrap();
        assert_eq!(tables, vec!["DEPARTMENTS".to_string()]);

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("owner = 'HR'"));
        assert!(queries[0].contains("ORDER BY table_name"));
    }

    #[tokio::test]
    async fn test_list_columns_parses_descriptors() {
        let source = MockSource::with_rows(vec![
            attr_row(&[
                ("COLUMN_NAME", SqlValue::Text("ID".into())),
                ("DATA_TYPE", SqlValue::Text("NUMBER".into())),
                ("CHAR_LENGTH", SqlValue::Int(0)),
                ("NULLABLE", SqlValue::Text("N".into())),
            ]),
            attr_row(&[
                ("COLUMN_NAME", SqlValue::Text("NAME".into())),
                ("DATA_TYPE", SqlValue::Text("VARCHAR2".into())),
                ("CHAR_LENGTH", SqlValue::Int(50)),
                ("NULLABLE", SqlValue::Text("Y".into())),
            ]),
        ]);
        let catalog = Catalog::new(&source);

        let table = catalog.list_columns("hr", "employees").await.unwrap();
        assert_eq!(table.schema, "HR");
        assert_eq!(table.name, "EMPLOYEES");
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].name, "ID");
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[0].char_length, None);
        assert_eq!(table.columns[1].char_length, Some(50));
        assert!(table.columns[1].nullable);
    }

    #[tokio::test]
    async fn test_primary_key_preserves_ordinal_order() {
        let source = MockSource::with_rows(vec![
            attr_row(&[
                ("CONSTRAINT_NAME", SqlValue::Text("JH_PK".into())),
                ("COLUMN_NAME", SqlValue::Text("EMPLOYEE_ID".into())),
                ("POSITION", SqlValue::Int(1)),
            ]),
            attr_row(&[
                ("CONSTRAINT_NAME", SqlValue::Text("JH_PK".into())),
                ("COLUMN_NAME", SqlValue::Text("START_DATE".into())),
                ("POSITION", SqlValue::Int(2)),
            ]),
        ]);
        let catalog = Catalog::new(&source);

        let pk = catalog
            .list_primary_key("hr", "job_history")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pk.columns, vec!["EMPLOYEE_ID", "START_DATE"]);

        let queries = source.queries.lock().unwrap();
        assert!(queries[0].contains("constraint_type = 'P'"));
        assert!(queries[0].contains("ORDER BY cols.constraint_name, cols.position"));
    }

    #[tokio::test]
    async fn test_unique_keys_group_all_constraints() {
        let source = MockSource::with_rows(vec![
            attr_row(&[
                ("CONSTRAINT_NAME", SqlValue::Text("UK_A".into())),
                ("COLUMN_NAME", SqlValue::Text("EMAIL".into())),
                ("POSITION", SqlValue::Int(1)),
            ]),
            attr_row(&[
                ("CONSTRAINT_NAME", SqlValue::Text("UK_B".into())),
                ("COLUMN_NAME", SqlValue::Text("BADGE".into())),
                ("POSITION", SqlValue::Int(1)),
            ]),
            attr_row(&[
                ("CONSTRAINT_NAME", SqlValue::Text("UK_B".into())),
                ("COLUMN_NAME", SqlValue::Text("REGION".into())),
                ("POSITION", SqlValue::Int(2)),
            ]),
        ]);
        let catalog = Catalog::new(&source);

        let keys = catalog.list_unique_keys("hr", "employees").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].name, "UK_A");
        assert_eq!(keys[0].columns, vec!["EMAIL"]);
        assert_eq!(keys[1].name, "UK_B");
        assert_eq!(keys[1].columns, vec!["BADGE", "REGION"]);
    }

    #[tokio::test]
    async fn test_sequence_bound_saturates_oracle_default_max() {
        let source = MockSource::with_rows(vec![attr_row(&[
            ("SEQUENCE_NAME", SqlValue::Text("EMP_SEQ".into())),
            ("LAST_NUMBER", SqlValue::Int(7)),
            ("MIN_VALUE", SqlValue::Int(1)),
            ("MAX_VALUE", SqlValue::Text("9999999999999999999999999999".into())),
        ])]);
        let catalog = Catalog::new(&source);

        let seqs = catalog.list_sequences("hr").await.unwrap();
        assert_eq!(seqs[0].max_value, u64::MAX);
        assert_eq!(seqs[0].last_number, 7);
    }

    #[tokio::test]
    async fn test_metadata_read_error_carries_schema() {
        struct FailingSource;

        #[async_trait]
        impl SourceDb for FailingSource {
            async fn query(&self, _sql: &str) -> Result<Vec<Row>> {
                Err(MigrateError::Source("ORA-01017: invalid username".into()))
            }

            fn stream(
                &self,
                _sql: String,
                _batch_size: usize,
            ) -> mpsc::Receiver<Result<Vec<Row>>> {
                let (_tx, rx) = mpsc::channel(1);
                rx
            }
        }

        let catalog = Catalog::new(&FailingSource);
        let err = catalog.list_tables("hr").await.unwrap_err();
        assert!(matches!(
            err,
            MigrateError::MetadataRead { ref schema, .. } if schema == "hr"
        ));
    }
}
