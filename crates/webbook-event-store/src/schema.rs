//! Delivery store database schema.
//!
//! Every statement is `IF NOT EXISTS`, so `ensure_schema` can run on each
//! start against an initialized store.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreError;

/// Raw deliveries, one row per accepted request.
pub const CREATE_WEBHOOKS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS gitlab_webhooks (
    id            INTEGER NOT NULL PRIMARY KEY ASC ON CONFLICT FAIL AUTOINCREMENT,
    created_at    INTEGER(4) NOT NULL DEFAULT (strftime('%s', 'now')),
    processed_at  INTEGER(4),
    gotAllHeaders BOOLEAN,
    contentLength INTEGER(4),
    userAgent     TEXT,
    eventType     TEXT,
    instance      TEXT,
    eventUuid     TEXT,
    token         TEXT,
    payload       TEXT
)
";

/// Normalized pipeline descriptors.
pub const CREATE_PIPELINE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS gitlab_pipeline (
    id           INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    created_at   INTEGER(4) NOT NULL DEFAULT (strftime('%s', 'now')),
    processed_at INTEGER(4),
    event_uuid   TEXT,
    instance     TEXT,
    pod_resource TEXT
)
";

/// Normalized build/job descriptors.
pub const CREATE_JOB_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS gitlab_job (
    id           INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    created_at   INTEGER(4) NOT NULL DEFAULT (strftime('%s', 'now')),
    processed_at INTEGER(4),
    event_uuid   TEXT,
    instance     TEXT,
    pod_resource TEXT
)
";

/// Pipeline projection over the raw payload column.
pub const CREATE_PIPELINES_VIEW: &str = r"
CREATE VIEW IF NOT EXISTS pipelines AS
    SELECT
        json_extract(payload, '$.object_kind')              AS kind,
        json_extract(payload, '$.object_attributes.id')     AS pipeline_id,
        json_extract(payload, '$.object_attributes.status') AS status,
        payload
    FROM gitlab_webhooks
    WHERE CASE
        WHEN json_valid(payload) THEN json_extract(payload, '$.object_kind')
    END = 'pipeline'
";

/// Relation name paired with its DDL, in creation order.
pub const SCHEMA: [(&str, &str); 4] = [
    ("gitlab_webhooks", CREATE_WEBHOOKS_TABLE),
    ("gitlab_pipeline", CREATE_PIPELINE_TABLE),
    ("gitlab_job", CREATE_JOB_TABLE),
    ("pipelines", CREATE_PIPELINES_VIEW),
];

/// Creates any missing relation. A no-op on an initialized store.
///
/// # Errors
///
/// Returns `StoreError::Schema` naming the relation whose DDL failed.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for (relation, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|source| StoreError::Schema { relation, source })?;
        debug!(relation, "relation ensured");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn relation_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE name IN ('gitlab_webhooks', 'gitlab_pipeline', 'gitlab_job', 'pipelines')",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = false)]
    async fn test_ensure_schema_creates_all_relations(pool: SqlitePool) {
        ensure_schema(&pool).await.unwrap();

        assert_eq!(relation_count(&pool).await, 4);
    }

    #[sqlx::test(migrations = false)]
    async fn test_ensure_schema_twice_is_a_no_op(pool: SqlitePool) {
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();

        assert_eq!(relation_count(&pool).await, 4);
    }

    #[sqlx::test(migrations = false)]
    async fn test_pipelines_view_is_a_view(pool: SqlitePool) {
        ensure_schema(&pool).await.unwrap();

        let kind: String =
            sqlx::query_scalar("SELECT type FROM sqlite_master WHERE name = 'pipelines'")
                .fetch_one(&pool)
                .await
                .unwrap();

        assert_eq!(kind, "view");
    }
}
