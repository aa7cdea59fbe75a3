//! Database operations for the `ohlc` table.
//!
//! # Key Operations
//!
//! - `bulk_write()` - Insert one batch in a single transaction
//! - `query_page()` - Filtered, time-ordered page plus total count
//! - `ping()` - Liveness probe used by `/health`

use async_trait::async_trait;
use ohlc_common::OhlcRecord;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{health_check, DbResult};
use crate::features::ohlc::repository::{OhlcPage, OhlcStore};
use crate::ingest::{RecordSink, SinkError};
use crate::models::OhlcRow;

/// Rows per INSERT statement. Six binds per row keeps every statement well
/// under the Postgres limit of 65535 bind parameters.
pub const INSERT_CHUNK_ROWS: usize = 5_000;

/// PostgreSQL-backed OHLC store
#[derive(Debug, Clone)]
pub struct PgOhlcRepository {
    pool: PgPool,
}

impl PgOhlcRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_all(&self, records: &[OhlcRecord]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO ohlc (ts_unix_ms, symbol, open, high, low, close) ");

            query_builder.push_values(chunk.iter(), |mut b, record| {
                b.push_bind(record.unix_ms())
                    .push_bind(record.symbol())
                    .push_bind(record.open())
                    .push_bind(record.high())
                    .push_bind(record.low())
                    .push_bind(record.close());
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await
    }
}

#[async_trait]
impl RecordSink for PgOhlcRepository {
    async fn bulk_write(&self, records: &[OhlcRecord]) -> Result<(), SinkError> {
        if records.is_empty() {
            return Ok(());
        }

        self.insert_all(records).await.map_err(|e| {
            tracing::error!(rows = records.len(), error = %e, "Bulk insert rolled back");
            SinkError::from(e)
        })
    }
}

#[async_trait]
impl OhlcStore for PgOhlcRepository {
    async fn query_page(&self, symbol: Option<&str>, limit: i64, offset: i64) -> DbResult<OhlcPage> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM ohlc
            WHERE ($1::TEXT IS NULL OR symbol = $1)
            "#,
        )
        .bind(symbol)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, OhlcRow>(
            r#"
            SELECT id, ts_unix_ms, symbol, open, high, low, close
            FROM ohlc
            WHERE ($1::TEXT IS NULL OR symbol = $1)
            ORDER BY ts_unix_ms ASC, id ASC
            LIMIT $2
            OFFSET $3
            "#,
        )
        .bind(symbol)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(OhlcPage { rows, total })
    }

    async fn ping(&self) -> DbResult<()> {
        health_check(&self.pool).await
    }
}
