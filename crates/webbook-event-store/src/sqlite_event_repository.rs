//! `SQLite` implementation of the `EventRepository` trait.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::{debug, info};

use webbook_core::error::IngestError;
use webbook_core::repository::{
    EventRepository, NewDelivery, RecordId, RecordedDelivery, ResourceTable,
};

use crate::error::StoreError;
use crate::schema;

const INSERT_WEBHOOK: &str = r"
INSERT INTO gitlab_webhooks
    (contentLength, userAgent, eventType, instance, eventUuid, payload, token, gotAllHeaders)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
RETURNING id, CAST(created_at AS INTEGER)
";

const INSERT_PIPELINE: &str =
    "INSERT INTO gitlab_pipeline (event_uuid, instance, pod_resource) VALUES (?, ?, ?)";

const INSERT_JOB: &str =
    "INSERT INTO gitlab_job (event_uuid, instance, pod_resource) VALUES (?, ?, ?)";

/// Opens the store at `location`, creating the file if needed, and ensures
/// the schema. Safe to call on every start.
///
/// The pool holds a single connection: the process shares one store handle
/// and `SQLite` serializes writers.
///
/// # Errors
///
/// Returns `StoreError::Open` if the file cannot be opened and
/// `StoreError::Schema` if a relation cannot be created.
pub async fn open_or_create_store(location: impl AsRef<Path>) -> Result<SqlitePool, StoreError> {
    let location = location.as_ref();
    let options = SqliteConnectOptions::new()
        .filename(location)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|source| StoreError::Open {
            location: location.display().to_string(),
            source,
        })?;

    schema::ensure_schema(&pool).await?;
    info!(location = %location.display(), "delivery store ready");

    Ok(pool)
}

fn storage_error(err: sqlx::Error) -> IngestError {
    IngestError::Storage(err.to_string())
}

/// SQLite-backed delivery repository.
#[derive(Debug, Clone)]
pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    /// Creates a new `SqliteEventRepository` over an initialized pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn append_delivery(
        &self,
        delivery: &NewDelivery,
    ) -> Result<RecordedDelivery, IngestError> {
        let event = &delivery.event;
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let (id, created_at): (i64, i64) = sqlx::query_as(INSERT_WEBHOOK)
            .bind(event.content_length.as_deref())
            .bind(event.user_agent.as_deref())
            .bind(event.event_type.as_deref())
            .bind(event.instance.as_deref())
            .bind(event.event_uuid.as_deref())
            .bind(event.payload.as_str())
            .bind(event.token.as_deref())
            .bind(event.got_all_headers)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;

        for resource in &delivery.resources {
            let statement = match resource.table {
                ResourceTable::Pipeline => INSERT_PIPELINE,
                ResourceTable::Job => INSERT_JOB,
            };
            sqlx::query(statement)
                .bind(event.event_uuid.as_deref())
                .bind(event.instance.as_deref())
                .bind(resource.descriptor.to_string())
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;

        let created_at = DateTime::from_timestamp(created_at, 0).ok_or_else(|| {
            IngestError::Storage(format!("created_at {created_at} is out of range"))
        })?;

        debug!(
            record_id = id,
            derived_rows = delivery.resources.len(),
            "delivery appended"
        );

        Ok(RecordedDelivery {
            record_id: RecordId(id),
            created_at,
        })
    }
}
