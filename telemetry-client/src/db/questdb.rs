use std::collections::HashMap;

use sqlx::postgres::PgPool;
use time::OffsetDateTime;

use super::{group_by_source, ReadingStore, StoreError};
use crate::domain::{Reading, Sample};

/// `ReadingStore` backed by QuestDB over its PostgreSQL wire protocol.
///
/// Table layout:
///
/// ```sql
/// readings (ts TIMESTAMP, source SYMBOL, value DOUBLE) timestamp(ts) PARTITION BY DAY
/// ```
#[derive(Clone)]
pub struct QuestDbReadingStore {
    pool: PgPool,
}

impl QuestDbReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `readings` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS readings (
                ts     TIMESTAMP,
                source SYMBOL,
                value  DOUBLE
            ) timestamp(ts) PARTITION BY DAY
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ReadingStore for QuestDbReadingStore {
    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO readings (ts, source, value) VALUES ($1, $2, $3)")
            .bind(reading.ts)
            .bind(&reading.source)
            .bind(reading.value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn query_range(
        &self,
        source: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Sample>, StoreError> {
        let rows = sqlx::query_as::<_, Sample>(
            r#"
            SELECT value, ts
            FROM readings
            WHERE source = $1
              AND ts >= $2
              AND ts <= $3
            ORDER BY ts
            "#,
        )
        .bind(source)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn query_multi(
        &self,
        sources: &[String],
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<HashMap<String, Vec<Sample>>, StoreError> {
        if sources.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, Reading>(
            r#"
            SELECT ts, source, value
            FROM readings
            WHERE source = ANY($1)
              AND ts >= $2
              AND ts <= $3
            ORDER BY ts
            "#,
        )
        .bind(sources)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_by_source(sources, rows))
    }

    async fn query_all(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Reading>, StoreError> {
        let rows = sqlx::query_as::<_, Reading>(
            r#"
            SELECT ts, source, value
            FROM readings
            WHERE ts >= $1
              AND ts <= $2
            ORDER BY ts
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
