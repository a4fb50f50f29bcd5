use crate::config::DatabaseConfig;
use crate::domain::model::{FlattenedRecord, RECORDS_TABLE, RECORD_COLUMNS};
use crate::domain::ports::RecordSink;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Postgres, QueryBuilder};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn create_table_sql() -> String {
    let columns = RECORD_COLUMNS
        .iter()
        .map(|(name, sql_type)| format!("    {} {}", name, sql_type))
        .collect::<Vec<_>>()
        .join(",\n");

    format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", RECORDS_TABLE, columns)
}

/// Builds one multi-row INSERT. Binds follow `RECORD_COLUMNS` order.
pub fn insert_query(chunk: &[FlattenedRecord]) -> QueryBuilder<'_, Postgres> {
    let columns = RECORD_COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("INSERT INTO {} ({}) ", RECORDS_TABLE, columns));

    query_builder.push_values(chunk, |mut b, record| {
        b.push_bind(&record.user_id)
            .push_bind(&record.oauth_consumer_key)
            .push_bind(&record.lis_result_sourcedid)
            .push_bind(&record.lis_outcome_service_url)
            .push_bind(record.is_correct)
            .push_bind(&record.attempt_type)
            .push_bind(parse_timestamp(&record.created_at));
    });

    query_builder
}

/// Accepts RFC 3339, naive `T`/space separated date-times and bare dates.
/// The offset of an RFC 3339 value is dropped, as a `TIMESTAMP` column does.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Ensures the table and inserts `records` in one transaction. Any error
/// drops the transaction, which rolls the whole batch back.
pub async fn write_batch(
    conn: &mut PgConnection,
    records: &[FlattenedRecord],
    chunk_size: usize,
) -> Result<u64> {
    let mut tx = conn.begin().await?;

    let ddl = create_table_sql();
    sqlx::query(&ddl).execute(&mut *tx).await?;
    tracing::info!("Table {} created or already exists", RECORDS_TABLE);

    if records.is_empty() {
        tx.commit().await?;
        tracing::warn!("No records to insert");
        return Ok(0);
    }

    let bad_timestamps = records
        .iter()
        .filter(|r| !r.created_at.trim().is_empty() && parse_timestamp(&r.created_at).is_none())
        .count();
    if bad_timestamps > 0 {
        tracing::warn!(
            "{} records have an unparsable created_at and are stored with NULL",
            bad_timestamps
        );
    }

    let total_chunks = records.len().div_ceil(chunk_size);
    let mut written = 0;

    for (chunk_idx, chunk) in records.chunks(chunk_size).enumerate() {
        tracing::debug!(
            "Inserting chunk {} / {} ({} rows)",
            chunk_idx + 1,
            total_chunks,
            chunk.len()
        );
        let mut query_builder = insert_query(chunk);
        let result = query_builder.build().execute(&mut *tx).await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    tracing::info!("{} records inserted into {}", written, RECORDS_TABLE);

    Ok(written)
}

/// PostgreSQL sink. Each `write` opens its own connection and closes it on
/// every exit path.
pub struct PostgresSink {
    options: PgConnectOptions,
    chunk_size: usize,
}

impl PostgresSink {
    pub fn new(options: PgConnectOptions, chunk_size: usize) -> Self {
        Self {
            options,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(config.connect_options(), config.insert_chunk_size())
    }
}

#[async_trait]
impl RecordSink for PostgresSink {
    async fn write(&self, records: &[FlattenedRecord]) -> Result<u64> {
        tracing::info!("Inserting {} records into the database", records.len());

        let mut conn = PgConnection::connect_with(&self.options).await?;
        let outcome = write_batch(&mut conn, records, self.chunk_size).await;

        if let Err(e) = conn.close().await {
            tracing::warn!("Error while closing database connection: {}", e);
        }
        tracing::info!("Database connection closed");

        outcome
    }
}

/// Logs a preview of the rows instead of writing them. Used by `--dry-run`.
pub struct PreviewSink {
    pub limit: usize,
}

#[async_trait]
impl RecordSink for PreviewSink {
    async fn write(&self, records: &[FlattenedRecord]) -> Result<u64> {
        tracing::info!("Dry run: {} records would be inserted", records.len());
        for record in records.iter().take(self.limit) {
            tracing::info!("{}", serde_json::to_string(record)?);
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql_matches_schema() {
        let sql = create_table_sql();

        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS records ("));
        assert!(sql.contains("user_id TEXT,"));
        assert!(sql.contains("is_correct BOOLEAN,"));
        assert!(sql.contains("created_at TIMESTAMP\n)"));
    }

    #[test]
    fn test_insert_query_binds_seven_per_row() {
        let records = vec![FlattenedRecord::default(), FlattenedRecord::default()];
        let query_builder = insert_query(&records);
        let sql = query_builder.sql();

        assert!(sql.starts_with(
            "INSERT INTO records (user_id, oauth_consumer_key, lis_result_sourcedid, \
             lis_outcome_service_url, is_correct, attempt_type, created_at) VALUES "
        ));
        assert!(sql.contains("($1, $2, $3, $4, $5, $6, $7)"));
        assert!(sql.contains("$14"));
        assert!(!sql.contains("$15"));
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 30)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2023-01-30T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-30 10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-30T10:00:00+03:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-30T10:00:00Z"), Some(expected));
        assert!(parse_timestamp("2023-01-30 10:00:00.123456").is_some());
        assert_eq!(
            parse_timestamp("2023-01-30"),
            NaiveDate::from_ymd_opt(2023, 1, 30).map(|d| d.and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[tokio::test]
    async fn test_preview_sink_writes_nothing() {
        let sink = PreviewSink { limit: 1 };
        let written = sink
            .write(&[FlattenedRecord::default(), FlattenedRecord::default()])
            .await
            .unwrap();
        assert_eq!(written, 0);
    }
}
