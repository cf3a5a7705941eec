//! Migration orchestrator - the ordered per-schema state machine.
//!
//! Each schema runs through a fixed sequence of phases: ensure schema,
//! create sequences, then per table create/copy/key, then foreign keys for
//! the whole schema, then indexes, then staged (never executed) trigger DDL.
//! Foreign keys are deferred to their own phase because a key may reference
//! a table that the per-table loop has not reached yet; they are only issued
//! once every table in the schema exists.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::generator;
use crate::source::{OracleOdbc, Row, SourceDb};
use crate::target::{PgTarget, TargetDb};

/// Migration orchestrator.
///
/// Owns nothing but the configuration and the two injected collaborators;
/// all catalog state is read fresh per run.
pub struct Orchestrator {
    config: Config,
    source: Arc<dyn SourceDb>,
    target: Arc<dyn TargetDb>,
}

/// Result of a full migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: completed, failed, or cancelled.
    pub status: String,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Per-schema outcome, in configured order.
    pub schemas: Vec<SchemaReport>,
}

impl MigrationReport {
    /// Convert to a pretty JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome of migrating one schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaReport {
    /// Source schema name as configured.
    pub schema: String,

    /// completed, failed, or cancelled.
    pub status: String,

    /// Tables fully migrated (created and copied).
    pub tables_migrated: usize,

    /// Tables aborted by metadata or statement failures.
    pub tables_failed: usize,

    /// Rows inserted into the target.
    pub rows_copied: u64,

    /// Rows that failed to serialize or insert. Reported, never silently
    /// dropped.
    pub rows_failed: u64,

    /// Sequences present on the target after the run.
    pub sequences_created: usize,

    /// Constraints (primary, unique, foreign) present after the run,
    /// including re-run "already exists" cases.
    pub constraints_added: usize,

    /// Constraints skipped after a non-tolerated execution failure.
    pub constraints_skipped: usize,

    /// Indexes present after the run.
    pub indexes_created: usize,

    /// Index statements that failed.
    pub indexes_failed: usize,

    /// Trigger statements generated for inspection. Never executed.
    pub triggers_staged: usize,

    /// Names of objects that failed, with their kind.
    pub failed_objects: Vec<String>,

    /// Fatal error that aborted the schema, if any.
    pub error: Option<String>,
}

impl SchemaReport {
    fn new(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            ..Default::default()
        }
    }
}

enum ExecOutcome {
    Applied,
    AlreadyExists,
    Failed(MigrateError),
}

impl Orchestrator {
    /// Create an orchestrator over explicit collaborators.
    pub fn new(config: Config, source: Arc<dyn SourceDb>, target: Arc<dyn TargetDb>) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    /// Open the configured Oracle and PostgreSQL collaborators and build an
    /// orchestrator over them. Connections are released when the
    /// orchestrator is dropped.
    pub async fn connect(config: Config) -> Result<Self> {
        let source = OracleOdbc::connect(&config.source).await?;
        let target = PgTarget::connect(&config.target).await?;
        Ok(Self::new(config, Arc::new(source), Arc::new(target)))
    }

    /// Run the migration for every configured schema.
    ///
    /// Schemas are processed independently in the order given; a schema
    /// aborting does not stop the ones after it. Cancellation is honored
    /// between phases and between tables, never mid-statement.
    pub async fn run(&self, cancel: Option<watch::Receiver<bool>>) -> Result<MigrationReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        let cancel = cancel.unwrap_or_else(|| {
            let (_, rx) = watch::channel(false);
            rx
        });

        info!("Starting migration run: {}", run_id);

        let mut schemas = Vec::new();
        let mut cancelled = false;
        for schema in &self.config.migration.schemas {
            if *cancel.borrow() {
                cancelled = true;
                break;
            }
            let report = self.migrate_schema(schema, &cancel).await;
            cancelled = report.status == "cancelled";
            schemas.push(report);
            if cancelled {
                break;
            }
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let status = if cancelled {
            "cancelled"
        } else if schemas.iter().any(|s| s.status == "failed") {
            "failed"
        } else {
            "completed"
        };

        let report = MigrationReport {
            run_id,
            status: status.to_string(),
            started_at,
            completed_at,
            duration_seconds: duration,
            schemas,
        };

        let rows: u64 = report.schemas.iter().map(|s| s.rows_copied).sum();
        info!(
            "Migration {}: {} schemas, {} rows in {:.1}s",
            report.status,
            report.schemas.len(),
            rows,
            report.duration_seconds
        );

        Ok(report)
    }

    /// Migrate one schema to completion, capturing the outcome.
    async fn migrate_schema(&self, schema: &str, cancel: &watch::Receiver<bool>) -> SchemaReport {
        let mut report = SchemaReport::new(schema);
        match self.run_schema(schema, cancel, &mut report).await {
            Ok(()) => report.status = "completed".to_string(),
            Err(MigrateError::Cancelled) => {
                warn!("{schema}: migration cancelled");
                report.status = "cancelled".to_string();
            }
            Err(e) => {
                error!("{schema}: schema migration aborted - {e}");
                report.status = "failed".to_string();
                report.error = Some(e.to_string());
            }
        }
        report
    }

    /// The per-schema phase sequence. Strictly ordered; no phase is skipped
    /// or reordered.
    async fn run_schema(
        &self,
        schema: &str,
        cancel: &watch::Receiver<bool>,
        report: &mut SchemaReport,
    ) -> Result<()> {
        let catalog = Catalog::new(self.source.as_ref());
        let migration = &self.config.migration;

        // Phase 1: ensure the target schema exists.
        info!("{schema}: ensuring target schema");
        let stmt = generator::create_schema(schema)?;
        self.execute_required(&stmt).await?;

        // Phase 2: sequences have no dependencies; create them first.
        self.check_cancel(cancel)?;
        let sequences = catalog.list_sequences(schema).await?;
        info!("{schema}: creating {} sequences", sequences.len());
        for seq in &sequences {
            match generator::create_sequence(schema, seq) {
                Ok(stmt) => match self.try_execute(&stmt).await {
                    ExecOutcome::Applied | ExecOutcome::AlreadyExists => {
                        report.sequences_created += 1;
                    }
                    ExecOutcome::Failed(e) => {
                        error!("{schema}: sequence {} failed - {e}", seq.name);
                        report.failed_objects.push(format!("sequence {}", seq.name));
                    }
                },
                Err(e) => {
                    error!("{schema}: sequence {} not generated - {e}", seq.name);
                    report.failed_objects.push(format!("sequence {}", seq.name));
                }
            }
        }

        // Phase 3: per-table create, copy, and table-local constraints.
        self.check_cancel(cancel)?;
        let tables = catalog.list_tables(schema).await?;
        info!("{schema}: migrating {} tables", tables.len());
        for table_name in &tables {
            self.check_cancel(cancel)?;
            match self.migrate_table(&catalog, schema, table_name, report).await {
                Ok(()) => report.tables_migrated += 1,
                // Catalog failures and cancellation abort the whole schema
                Err(e @ (MigrateError::MetadataRead { .. } | MigrateError::Cancelled)) => {
                    return Err(e)
                }
                Err(e) => {
                    error!("{schema}.{table_name}: table aborted - {e}");
                    report.tables_failed += 1;
                    report.failed_objects.push(format!("table {table_name}"));
                }
            }
        }

        // Phase 4: foreign keys, only after every table in the schema
        // exists. A key may reference a table processed later in phase 3.
        self.check_cancel(cancel)?;
        if migration.create_foreign_keys {
            let foreign_keys = catalog.list_foreign_keys(schema).await?;
            info!("{schema}: adding {} foreign keys", foreign_keys.len());
            for fk in &foreign_keys {
                let label = format!("foreign key {}.{} -> {}.{}", fk.table, fk.column, fk.ref_table, fk.ref_column);
                self.apply_constraint(generator::add_foreign_key(fk), &label, report)
                    .await;
            }
        }

        // Phase 5: indexes, sequenced after constraints.
        self.check_cancel(cancel)?;
        if migration.create_indexes {
            let indexes = catalog.list_indexes(schema).await?;
            info!("{schema}: creating {} indexes", indexes.len());
            for idx in &indexes {
                match generator::create_index(schema, idx) {
                    Ok(stmt) => match self.try_execute(&stmt).await {
                        ExecOutcome::Applied | ExecOutcome::AlreadyExists => {
                            report.indexes_created += 1;
                        }
                        ExecOutcome::Failed(e) => {
                            error!("{schema}: index {} failed - {e}", idx.name);
                            report.indexes_failed += 1;
                            report.failed_objects.push(format!("index {}", idx.name));
                        }
                    },
                    Err(e) => {
                        error!("{schema}: index {} not generated - {e}", idx.name);
                        report.indexes_failed += 1;
                        report.failed_objects.push(format!("index {}", idx.name));
                    }
                }
            }
        }

        // Phase 6: trigger DDL is generated for inspection only. Procedural
        // bodies are not portable across dialects; nothing is executed.
        if migration.stage_triggers {
            let triggers = catalog.list_triggers(schema).await?;
            for trg in &triggers {
                match generator::create_trigger(schema, trg) {
                    Ok(stmt) => {
                        info!("{schema}: staged trigger {} (not executed):\n{stmt}", trg.name);
                        report.triggers_staged += 1;
                    }
                    Err(e) => {
                        warn!("{schema}: trigger {} not staged - {e}", trg.name);
                        report.failed_objects.push(format!("trigger {}", trg.name));
                    }
                }
            }
        }

        Ok(())
    }

    /// Migrate one table: create it, copy its rows, add its primary key and
    /// unique constraints. Any error aborts the remaining steps for this
    /// table only.
    async fn migrate_table(
        &self,
        catalog: &Catalog<'_>,
        schema: &str,
        table_name: &str,
        report: &mut SchemaReport,
    ) -> Result<()> {
        let table = catalog.list_columns(schema, table_name).await?;
        debug!("{schema}.{table_name}: creating table");
        let stmt = generator::create_table(&table)?;
        self.execute_required(&stmt).await?;

        self.copy_table_data(catalog, schema, table_name, report)
            .await?;

        if let Some(pk) = catalog.list_primary_key(schema, table_name).await? {
            let label = format!("primary key on {table_name}");
            self.apply_constraint(generator::add_primary_key(&pk), &label, report)
                .await;
        }

        for uk in catalog.list_unique_keys(schema, table_name).await? {
            let label = format!("unique {} on {table_name}", uk.name);
            self.apply_constraint(generator::add_unique(&uk), &label, report)
                .await;
        }

        Ok(())
    }

    /// Stream rows from the source and insert them in batches.
    ///
    /// A failed batch statement is retried row by row so only the rows that
    /// are genuinely bad are reported as failed; the copy of the remaining
    /// rows continues either way.
    async fn copy_table_data(
        &self,
        catalog: &Catalog<'_>,
        schema: &str,
        table_name: &str,
        report: &mut SchemaReport,
    ) -> Result<()> {
        let sql = catalog.row_data_sql(schema, table_name)?;
        let mut rx = self
            .source
            .stream(sql, self.config.migration.stream_batch_size);

        let mut copied: u64 = 0;
        let mut failed: u64 = 0;

        while let Some(message) = rx.recv().await {
            match message {
                Ok(rows) => {
                    for chunk in rows.chunks(self.config.migration.insert_batch_size) {
                        match self.insert_rows(schema, table_name, chunk).await {
                            Ok(()) => copied += chunk.len() as u64,
                            Err(_) if chunk.len() > 1 => {
                                for row in chunk {
                                    match self
                                        .insert_rows(schema, table_name, std::slice::from_ref(row))
                                        .await
                                    {
                                        Ok(()) => copied += 1,
                                        Err(e) => {
                                            warn!("{schema}.{table_name}: row insert failed - {e}");
                                            failed += 1;
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                warn!("{schema}.{table_name}: row insert failed - {e}");
                                failed += 1;
                            }
                        }
                    }
                }
                // A row that could not be represented is reported and
                // skipped; the stream continues with the rows after it.
                Err(e @ MigrateError::UnsupportedValueType { .. }) => {
                    warn!("{schema}.{table_name}: {e}");
                    failed += 1;
                }
                Err(e) => {
                    // Keep the partial counts visible in the report
                    report.rows_copied += copied;
                    report.rows_failed += failed;
                    return Err(e);
                }
            }
        }

        info!("{schema}.{table_name}: copied {copied} rows ({failed} failed)");
        report.rows_copied += copied;
        report.rows_failed += failed;
        Ok(())
    }

    async fn insert_rows(&self, schema: &str, table_name: &str, rows: &[Row]) -> Result<()> {
        let stmt = generator::insert_rows(schema, table_name, rows)?;
        self.execute(&stmt).await
    }

    /// Apply a constraint statement: "already exists" supports re-runs and
    /// counts as present; any other failure is reported and the constraint
    /// is skipped, but the migration continues.
    async fn apply_constraint(
        &self,
        stmt: Result<String>,
        label: &str,
        report: &mut SchemaReport,
    ) {
        match stmt {
            Ok(stmt) => match self.try_execute(&stmt).await {
                ExecOutcome::Applied => report.constraints_added += 1,
                ExecOutcome::AlreadyExists => {
                    info!("{label}: already exists, tolerated");
                    report.constraints_added += 1;
                }
                ExecOutcome::Failed(e) => {
                    error!("{label}: failed - {e}");
                    report.constraints_skipped += 1;
                    report.failed_objects.push(label.to_string());
                }
            },
            Err(e) => {
                error!("{label}: not generated - {e}");
                report.constraints_skipped += 1;
                report.failed_objects.push(label.to_string());
            }
        }
    }

    /// Execute a statement whose failure aborts the calling unit, except
    /// that "already exists" is a no-op.
    async fn execute_required(&self, sql: &str) -> Result<()> {
        match self.try_execute(sql).await {
            ExecOutcome::Applied => Ok(()),
            ExecOutcome::AlreadyExists => {
                debug!("already exists, skipping: {sql}");
                Ok(())
            }
            ExecOutcome::Failed(e) => Err(e),
        }
    }

    async fn try_execute(&self, sql: &str) -> ExecOutcome {
        match self.execute(sql).await {
            Ok(()) => ExecOutcome::Applied,
            Err(e) if e.is_already_exists() => ExecOutcome::AlreadyExists,
            Err(e) => ExecOutcome::Failed(e),
        }
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        if self.config.migration.show_sql {
            info!("SQL: {sql}");
        }
        self.target.execute(sql).await
    }

    fn check_cancel(&self, cancel: &watch::Receiver<bool>) -> Result<()> {
        if *cancel.borrow() {
            Err(MigrateError::Cancelled)
        } else {
            Ok(())
        }
    }
}
