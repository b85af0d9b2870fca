//! Integration tests for `SqliteEventRepository`.

use serde_json::json;
use sqlx::SqlitePool;
use webbook_core::repository::{
    DerivedResource, EventRepository, NewDelivery, RecordId, ResourceTable,
};
use webbook_event_store::schema::ensure_schema;
use webbook_event_store::{SqliteEventRepository, open_or_create_store};
use webbook_test_support::fixtures;

async fn repo_with_schema(pool: &SqlitePool) -> SqliteEventRepository {
    ensure_schema(pool).await.unwrap();
    SqliteEventRepository::new(pool.clone())
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

fn raw_only(payload: &serde_json::Value) -> NewDelivery {
    NewDelivery {
        event: fixtures::inbound_event(payload),
        resources: vec![],
    }
}

// --- open_or_create_store ---

#[tokio::test]
async fn test_open_or_create_store_creates_file_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let location = dir.path().join("webbook.db");

    let pool = open_or_create_store(&location).await.unwrap();

    assert!(location.exists());
    assert_eq!(count(&pool, "gitlab_webhooks").await, 0);
    assert_eq!(count(&pool, "gitlab_pipeline").await, 0);
    assert_eq!(count(&pool, "gitlab_job").await, 0);
    assert_eq!(count(&pool, "pipelines").await, 0);
}

#[tokio::test]
async fn test_open_or_create_store_twice_keeps_rows_and_relations() {
    let dir = tempfile::tempdir().unwrap();
    let location = dir.path().join("webbook.db");

    let first = open_or_create_store(&location).await.unwrap();
    SqliteEventRepository::new(first.clone())
        .append_delivery(&raw_only(&fixtures::push_event()))
        .await
        .unwrap();
    first.close().await;

    let second = open_or_create_store(&location).await.unwrap();

    let relations: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master \
         WHERE name IN ('gitlab_webhooks', 'gitlab_pipeline', 'gitlab_job', 'pipelines')",
    )
    .fetch_one(&second)
    .await
    .unwrap();
    assert_eq!(relations, 4);
    assert_eq!(count(&second, "gitlab_webhooks").await, 1);
}

#[tokio::test]
async fn test_open_or_create_store_fails_for_unreachable_location() {
    let dir = tempfile::tempdir().unwrap();
    let location = dir.path().join("missing-dir").join("webbook.db");

    let result = open_or_create_store(&location).await;

    assert!(matches!(
        result,
        Err(webbook_event_store::StoreError::Open { .. })
    ));
}

// --- append_delivery ---

#[sqlx::test(migrations = false)]
async fn test_append_stores_all_header_fields_and_payload(pool: SqlitePool) {
    let repo = repo_with_schema(&pool).await;
    let delivery = raw_only(&fixtures::push_event());
    let expected = delivery.event.clone();

    let recorded = repo.append_delivery(&delivery).await.unwrap();

    let row: (i64, i64, String, String, String, String, String, String, bool) = sqlx::query_as(
        "SELECT id, contentLength, userAgent, eventType, instance, eventUuid, token, payload, \
         gotAllHeaders FROM gitlab_webhooks",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(RecordId(row.0), recorded.record_id);
    assert_eq!(
        row.1.to_string(),
        expected.content_length.unwrap(),
        "content length is stored with integer affinity"
    );
    assert_eq!(Some(row.2), expected.user_agent);
    assert_eq!(Some(row.3), expected.event_type);
    assert_eq!(Some(row.4), expected.instance);
    assert_eq!(Some(row.5), expected.event_uuid);
    assert_eq!(Some(row.6), expected.token);
    assert_eq!(row.7, expected.payload);
    assert!(row.8);
}

#[sqlx::test(migrations = false)]
async fn test_append_assigns_increasing_ids_and_created_at(pool: SqlitePool) {
    let repo = repo_with_schema(&pool).await;
    let before = chrono::Utc::now().timestamp();

    let first = repo
        .append_delivery(&raw_only(&fixtures::push_event()))
        .await
        .unwrap();
    let second = repo
        .append_delivery(&raw_only(&fixtures::push_event()))
        .await
        .unwrap();

    assert!(second.record_id > first.record_id);
    assert!(first.created_at.timestamp() >= before - 1);
}

#[sqlx::test(migrations = false)]
async fn test_duplicate_event_uuid_is_stored_twice(pool: SqlitePool) {
    let repo = repo_with_schema(&pool).await;
    let delivery = raw_only(&fixtures::push_event());

    repo.append_delivery(&delivery).await.unwrap();
    repo.append_delivery(&delivery).await.unwrap();

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gitlab_webhooks WHERE eventUuid = ?")
        .bind(delivery.event.event_uuid.as_deref())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 2);
}

#[sqlx::test(migrations = false)]
async fn test_append_writes_derived_rows_to_their_tables(pool: SqlitePool) {
    let repo = repo_with_schema(&pool).await;
    let delivery = NewDelivery {
        event: fixtures::inbound_event(&fixtures::concrete_pipeline_event()),
        resources: vec![
            DerivedResource {
                table: ResourceTable::Pipeline,
                descriptor: json!({ "pipeline_id": 42 }),
            },
            DerivedResource {
                table: ResourceTable::Job,
                descriptor: json!({ "build_id": 7 }),
            },
        ],
    };

    repo.append_delivery(&delivery).await.unwrap();

    let (uuid, instance, resource): (String, String, String) =
        sqlx::query_as("SELECT event_uuid, instance, pod_resource FROM gitlab_pipeline")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(Some(uuid), delivery.event.event_uuid);
    assert_eq!(instance, fixtures::TEST_INSTANCE);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&resource).unwrap(),
        json!({ "pipeline_id": 42 })
    );

    let job: String = sqlx::query_scalar("SELECT pod_resource FROM gitlab_job")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&job).unwrap(),
        json!({ "build_id": 7 })
    );
}

#[sqlx::test(migrations = false)]
async fn test_payload_with_non_ascii_text_is_stored_verbatim(pool: SqlitePool) {
    let repo = repo_with_schema(&pool).await;
    let body = r#"{"object_kind":"note","object_attributes":{"note":"Grüße é — ✓"}}"#;
    let mut event = fixtures::inbound_event(&json!({}));
    event.payload = body.to_owned();

    repo.append_delivery(&NewDelivery {
        event,
        resources: vec![],
    })
    .await
    .unwrap();

    let stored: String = sqlx::query_scalar("SELECT payload FROM gitlab_webhooks")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, body);
}

#[sqlx::test(migrations = false)]
async fn test_append_fails_without_schema(pool: SqlitePool) {
    let repo = SqliteEventRepository::new(pool);

    let result = repo
        .append_delivery(&raw_only(&fixtures::push_event()))
        .await;

    assert!(matches!(
        result,
        Err(webbook_core::error::IngestError::Storage(_))
    ));
}

// --- pipelines view ---

#[sqlx::test(migrations = false)]
async fn test_pipelines_view_matches_direct_payload_read(pool: SqlitePool) {
    let repo = repo_with_schema(&pool).await;
    let payload = fixtures::concrete_pipeline_event();
    repo.append_delivery(&raw_only(&payload)).await.unwrap();
    repo.append_delivery(&raw_only(&fixtures::push_event()))
        .await
        .unwrap();

    let rows: Vec<(String, i64, String)> =
        sqlx::query_as("SELECT kind, pipeline_id, status FROM pipelines")
            .fetch_all(&pool)
            .await
            .unwrap();

    assert_eq!(rows.len(), 1, "only pipeline payloads are projected");
    let (kind, pipeline_id, status) = &rows[0];
    assert_eq!(kind, payload["object_kind"].as_str().unwrap());
    assert_eq!(*pipeline_id, payload["object_attributes"]["id"].as_i64().unwrap());
    assert_eq!(status, payload["object_attributes"]["status"].as_str().unwrap());
}

#[sqlx::test(migrations = false)]
async fn test_pipelines_view_skips_non_json_payloads(pool: SqlitePool) {
    let repo = repo_with_schema(&pool).await;
    let mut event = fixtures::inbound_event(&json!({}));
    event.payload = "not json at all".to_owned();
    repo.append_delivery(&NewDelivery {
        event,
        resources: vec![],
    })
    .await
    .unwrap();

    assert_eq!(count(&pool, "pipelines").await, 0);
}
