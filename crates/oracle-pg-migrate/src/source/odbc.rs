//! ODBC-based Oracle source.
//!
//! Reaches Oracle through an installed Oracle ODBC driver (Instant Client
//! `sqora` on Linux/macOS, the vendor driver on Windows). Values are fetched
//! through ODBC's text conversion and re-typed per column from the result
//! set metadata, so the rest of the pipeline only ever sees [`SqlValue`].
//!
//! ODBC work is blocking; every call runs on `spawn_blocking` with its own
//! short-lived connection.

use std::sync::Arc;

use async_trait::async_trait;
use odbc_api::buffers::TextRowSet;
use odbc_api::{ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{SessionMode, SourceConfig};
use crate::core::value::SqlValue;
use crate::error::{MigrateError, Result};

use super::{Row, SourceDb};

/// Rows per ODBC fetch buffer.
const FETCH_BUFFER_ROWS: usize = 1000;

/// Upper bound on one text cell in the fetch buffer.
const MAX_CELL_BYTES: usize = 65536;

/// ODBC-backed Oracle source collaborator.
pub struct OracleOdbc {
    inner: Arc<Inner>,
}

struct Inner {
    env: Environment,
    connection_string: String,
}

/// How a result column's text representation converts to a [`SqlValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColKind {
    Int,
    Float,
    Bytes,
    Text,
}

impl OracleOdbc {
    /// Open the ODBC environment and verify a connection.
    ///
    /// The environment lives for the whole migration run; individual
    /// connections are created per query and dropped with it.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let config = config.clone();
        tokio::task::spawn_blocking(move || Self::connect_blocking(&config))
            .await
            .map_err(|e| MigrateError::Source(format!("source worker panicked: {e}")))?
    }

    fn connect_blocking(config: &SourceConfig) -> Result<Self> {
        let env = Environment::new().map_err(|e| {
            MigrateError::pool(
                format!(
                    "Failed to create ODBC environment: {}. \
                     Make sure an Oracle ODBC driver is installed \
                     (Oracle Instant Client with the ODBC package).",
                    e
                ),
                "ODBC connection",
            )
        })?;

        let connection_string = build_connection_string(config);

        debug!(
            "ODBC connection string (credentials hidden): \
             Driver={{Oracle ODBC Driver}};DBQ=//{}:{}/{};...",
            config.host, config.port, config.sid
        );

        // Verify connectivity before handing the environment out
        {
            let conn = env
                .connect_with_connection_string(&connection_string, ConnectionOptions::default())
                .map_err(|e| {
                    MigrateError::pool(
                        format!("Failed to connect to Oracle via ODBC: {}", e),
                        "ODBC connection",
                    )
                })?;
            let _ = conn.execute("SELECT 1 FROM dual", ());
        }

        info!(
            "Connected to Oracle via ODBC: {}:{}/{}",
            config.host, config.port, config.sid
        );

        Ok(Self {
            inner: Arc::new(Inner {
                env,
                connection_string,
            }),
        })
    }
}

#[async_trait]
impl SourceDb for OracleOdbc {
    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let inner = self.inner.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || inner.collect_rows(&sql))
            .await
            .map_err(|e| MigrateError::Source(format!("source worker panicked: {e}")))?
    }

    fn stream(&self, sql: String, batch_size: usize) -> mpsc::Receiver<Result<Vec<Row>>> {
        let (tx, rx) = mpsc::channel(2);
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.stream_rows(&sql, batch_size, tx));
        rx
    }
}

impl Inner {
    fn connection(&self) -> Result<odbc_api::Connection<'_>> {
        self.env
            .connect_with_connection_string(&self.connection_string, ConnectionOptions::default())
            .map_err(|e| {
                MigrateError::pool(
                    format!("ODBC connection failed: {}", e),
                    "getting ODBC connection",
                )
            })
    }

    /// Run a query and collect every row. Used for catalog metadata; a value
    /// that cannot be converted fails the whole call.
    fn collect_rows(&self, sql: &str) -> Result<Vec<Row>> {
        let conn = self.connection()?;
        let mut rows = Vec::new();

        let Some(mut cursor) = conn
            .execute(sql, ())
            .map_err(|e| MigrateError::Source(format!("ODBC query failed: {e} - SQL: {sql}")))?
        else {
            return Ok(rows);
        };

        let (names, kinds) = result_shape(&mut cursor)?;

        let mut buffers =
            TextRowSet::for_cursor(FETCH_BUFFER_ROWS, &mut cursor, Some(MAX_CELL_BYTES))
                .map_err(|e| MigrateError::Source(format!("Failed to create row buffer: {e}")))?;
        let mut row_cursor = cursor
            .bind_buffer(&mut buffers)
            .map_err(|e| MigrateError::Source(format!("Failed to bind buffer: {e}")))?;

        while let Some(batch) = row_cursor
            .fetch()
            .map_err(|e| MigrateError::Source(format!("Failed to fetch rows: {e}")))?
        {
            for row_idx in 0..batch.num_rows() {
                rows.push(convert_row(batch, row_idx, &names, &kinds)?);
            }
        }

        Ok(rows)
    }

    /// Run a query and push converted rows down the channel in batches.
    ///
    /// A row that fails conversion is sent as its own `Err` message and
    /// streaming continues; a read failure is sent and ends the stream.
    fn stream_rows(&self, sql: &str, batch_size: usize, tx: mpsc::Sender<Result<Vec<Row>>>) {
        let send = |msg: Result<Vec<Row>>| tx.blocking_send(msg).is_ok();

        let conn = match self.connection() {
            Ok(conn) => conn,
            Err(e) => {
                send(Err(e));
                return;
            }
        };

        let cursor = conn
            .execute(sql, ())
            .map_err(|e| MigrateError::Source(format!("ODBC query failed: {e} - SQL: {sql}")));
        let Some(mut cursor) = (match cursor {
            Ok(cursor) => cursor,
            Err(e) => {
                send(Err(e));
                return;
            }
        }) else {
            return;
        };

        let (names, kinds) = match result_shape(&mut cursor) {
            Ok(shape) => shape,
            Err(e) => {
                send(Err(e));
                return;
            }
        };

        let buffer_rows = batch_size.clamp(1, FETCH_BUFFER_ROWS);
        let mut buffers =
            match TextRowSet::for_cursor(buffer_rows, &mut cursor, Some(MAX_CELL_BYTES)) {
                Ok(buffers) => buffers,
                Err(e) => {
                    send(Err(MigrateError::Source(format!(
                        "Failed to create row buffer: {e}"
                    ))));
                    return;
                }
            };
        let mut row_cursor = match cursor.bind_buffer(&mut buffers) {
            Ok(rc) => rc,
            Err(e) => {
                send(Err(MigrateError::Source(format!(
                    "Failed to bind buffer: {e}"
                ))));
                return;
            }
        };

        let mut pending: Vec<Row> = Vec::with_capacity(batch_size);
        loop {
            let batch = match row_cursor.fetch() {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(e) => {
                    send(Err(MigrateError::Source(format!(
                        "Failed to fetch rows: {e}"
                    ))));
                    return;
                }
            };

            for row_idx in 0..batch.num_rows() {
                match convert_row(batch, row_idx, &names, &kinds) {
                    Ok(row) => {
                        pending.push(row);
                        if pending.len() >= batch_size && !send(Ok(std::mem::take(&mut pending)))
                        {
                            return;
                        }
                    }
                    Err(e @ MigrateError::UnsupportedValueType { .. }) => {
                        // Flush what we have so row order is preserved,
                        // then report the bad row and keep going.
                        if !pending.is_empty() && !send(Ok(std::mem::take(&mut pending))) {
                            return;
                        }
                        if !send(Err(e)) {
                            return;
                        }
                    }
                    Err(e) => {
                        send(Err(e));
                        return;
                    }
                }
            }
        }

        if !pending.is_empty() {
            send(Ok(pending));
        }
    }
}

/// Build the Oracle ODBC connection string.
fn build_connection_string(config: &SourceConfig) -> String {
    let mut conn_str = format!(
        "Driver={{Oracle ODBC Driver}};DBQ=//{}:{}/{};UID={};PWD={};",
        config.host, config.port, config.sid, config.user, config.password
    );
    // DBA=W requests an AS SYSDBA session from the Oracle ODBC driver
    if config.mode == SessionMode::Sysdba {
        conn_str.push_str("DBA=W;");
    }
    conn_str
}

/// Read column names and per-column conversion kinds from cursor metadata.
fn result_shape(cursor: &mut impl ResultSetMetadata) -> Result<(Vec<String>, Vec<ColKind>)> {
    let names: Vec<String> = cursor
        .column_names()
        .map_err(|e| MigrateError::Source(format!("Failed to read column names: {e}")))?
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| MigrateError::Source(format!("Failed to read column names: {e}")))?;

    let mut kinds = Vec::with_capacity(names.len());
    for idx in 0..names.len() {
        let data_type = cursor
            .col_data_type((idx + 1) as u16)
            .map_err(|e| MigrateError::Source(format!("Failed to read column type: {e}")))?;
        kinds.push(classify(&data_type));
    }

    Ok((names, kinds))
}

fn classify(data_type: &DataType) -> ColKind {
    match data_type {
        DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
            ColKind::Int
        }
        DataType::Numeric { scale: 0, .. } | DataType::Decimal { scale: 0, .. } => ColKind::Int,
        DataType::Numeric { .. }
        | DataType::Decimal { .. }
        | DataType::Float { .. }
        | DataType::Real
        | DataType::Double => ColKind::Float,
        DataType::Binary { .. } | DataType::Varbinary { .. } | DataType::LongVarbinary { .. } => {
            ColKind::Bytes
        }
        _ => ColKind::Text,
    }
}

fn convert_row(
    batch: &TextRowSet,
    row_idx: usize,
    names: &[String],
    kinds: &[ColKind],
) -> Result<Row> {
    let mut values = Vec::with_capacity(kinds.len());
    for (col_idx, kind) in kinds.iter().enumerate() {
        values.push(convert_value(
            batch.at(col_idx, row_idx),
            *kind,
            &names[col_idx],
        )?);
    }
    Ok(Row::new(names.to_vec(), values))
}

/// Convert one ODBC text cell into a [`SqlValue`] per its column kind.
///
/// A value the closed union cannot represent fails loudly here; nothing is
/// coerced to text behind the column type's back.
fn convert_value(text: Option<&[u8]>, kind: ColKind, column: &str) -> Result<SqlValue> {
    let Some(bytes) = text else {
        return Ok(SqlValue::Null);
    };
    let s = String::from_utf8_lossy(bytes);

    match kind {
        // Oracle NUMBER columns with scale 0 can still exceed i64 when the
        // declared precision is wider; fall back to float rather than text.
        ColKind::Int => {
            let t = s.trim();
            t.parse::<i64>()
                .map(SqlValue::Int)
                .or_else(|_| t.parse::<f64>().map(SqlValue::Float))
                .map_err(|_| unsupported(column, &s))
        }
        ColKind::Float => s
            .trim()
            .parse::<f64>()
            .map(SqlValue::Float)
            .map_err(|_| unsupported(column, &s)),
        ColKind::Bytes => decode_hex(s.trim())
            .map(SqlValue::Bytes)
            .ok_or_else(|| unsupported(column, &s)),
        ColKind::Text => Ok(SqlValue::Text(s.into_owned())),
    }
}

fn unsupported(column: &str, value: &str) -> MigrateError {
    let preview: String = value.chars().take(32).collect();
    warn!("column {column}: unconvertible value {preview:?}");
    MigrateError::UnsupportedValueType {
        column: column.to_string(),
        message: format!("cannot represent driver value {preview:?}"),
    }
}

/// Decode ODBC's hex rendering of binary columns.
fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string_includes_sysdba_flag() {
        let config = SourceConfig {
            host: "db1".to_string(),
            port: 1521,
            sid: "XEPDB1".to_string(),
            user: "system".to_string(),
            password: "oracle".to_string(),
            mode: SessionMode::Sysdba,
        };
        let conn_str = build_connection_string(&config);
        assert!(conn_str.contains("DBQ=//db1:1521/XEPDB1"));
        assert!(conn_str.ends_with("DBA=W;"));

        let normal = SourceConfig {
            mode: SessionMode::Normal,
            ..config
        };
        assert!(!build_connection_string(&normal).contains("DBA=W"));
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("DEADBEEF"), Some(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(decode_hex("00ff"), Some(vec![0x00, 0xff]));
        assert_eq!(decode_hex(""), Some(vec![]));
        assert_eq!(decode_hex("abc"), None);
        assert_eq!(decode_hex("zz"), None);
    }

    #[test]
    fn test_convert_value_typed_by_column_kind() {
        assert_eq!(
            convert_value(Some(b"42"), ColKind::Int, "ID").unwrap(),
            SqlValue::Int(42)
        );
        assert_eq!(
            convert_value(Some(b"1.5"), ColKind::Float, "RATE").unwrap(),
            SqlValue::Float(1.5)
        );
        assert_eq!(
            convert_value(Some(b"CAFE"), ColKind::Bytes, "BLOB_COL").unwrap(),
            SqlValue::Bytes(vec![0xca, 0xfe])
        );
        assert_eq!(
            convert_value(Some(b"Ada"), ColKind::Text, "NAME").unwrap(),
            SqlValue::Text("Ada".into())
        );
        assert_eq!(
            convert_value(None, ColKind::Int, "ID").unwrap(),
            SqlValue::Null
        );
    }

    #[test]
    fn test_wide_scale_zero_number_falls_back_to_float() {
        let v = convert_value(Some(b"99999999999999999999999999"), ColKind::Int, "N").unwrap();
        assert!(matches!(v, SqlValue::Float(_)));
    }

    #[test]
    fn test_unconvertible_value_fails_loudly() {
        let err = convert_value(Some(b"not a number"), ColKind::Int, "ID").unwrap_err();
        assert!(matches!(
            err,
            MigrateError::UnsupportedValueType { ref column, .. } if column == "ID"
        ));
    }
}
