//! PostgreSQL target executor.
//!
//! Uses deadpool-postgres for connection pooling. Every statement is issued
//! through `simple_query` on its own checkout and commits on its own; the
//! orchestrator's sequencing is the only transaction structure there is.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::info;

use crate::config::TargetConfig;
use crate::error::{MigrateError, Result};

use super::TargetDb;

/// Connection timeout for new checkouts.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// The orchestrator is strictly sequential; a small pool covers connection
/// recycling without concurrency.
const POOL_MAX_SIZE: usize = 4;

/// PostgreSQL target collaborator.
pub struct PgTarget {
    pool: Pool,
}

impl PgTarget {
    /// Create a pooled connection to the target and verify it.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.keepalives(true);
        pg_config.keepalives_idle(Duration::from_secs(30));
        pg_config.connect_timeout(POOL_CONNECTION_TIMEOUT);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(POOL_MAX_SIZE)
            .build()
            .map_err(|e| MigrateError::pool(e, "creating PostgreSQL target pool"))?;

        // Test connection
        let client = pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, "testing PostgreSQL target connection"))?;
        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to PostgreSQL target: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl TargetDb for PgTarget {
    async fn execute(&self, sql: &str) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, "getting PostgreSQL connection"))?;

        client
            .simple_query(sql)
            .await
            .map_err(|e| statement_error(sql, e))?;
        Ok(())
    }
}

/// Turn a driver error into a `Statement` error carrying the SQLSTATE the
/// orchestrator's tolerance policy keys on.
fn statement_error(sql: &str, e: tokio_postgres::Error) -> MigrateError {
    let code = e.code().map(|c| c.code().to_string());
    let message = e
        .as_db_error()
        .map(|db| db.message().to_string())
        .unwrap_or_else(|| e.to_string());
    MigrateError::statement(sql, code, message)
}
