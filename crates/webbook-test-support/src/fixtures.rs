//! GitLab webhook payload fixtures.
//!
//! Shapes follow the payloads GitLab sends, trimmed to the fields the
//! recorder reads plus enough surrounding noise to keep tests honest.

use serde_json::{Value, json};
use webbook_core::event::InboundEvent;
use webbook_core::headers::GitlabHeaders;

/// Secret the fixtures sign their deliveries with.
pub const TEST_SECRET: &str = "MyGitLabToken";

/// Instance URL the fixtures claim to come from.
pub const TEST_INSTANCE: &str = "https://gitlab.example.com";

/// A build entry nested in a pipeline payload.
#[must_use]
pub fn pipeline_build(id: i64, status: &str, runner_id: i64, runner_description: &str) -> Value {
    json!({
        "id": id,
        "stage": "test",
        "name": format!("job-{id}"),
        "status": status,
        "created_at": "2026-01-15 09:58:00 UTC",
        "started_at": "2026-01-15 09:58:10 UTC",
        "finished_at": "2026-01-15 09:59:52 UTC",
        "duration": 102.384_517,
        "queued_duration": 9.5,
        "failure_reason": null,
        "when": "on_success",
        "manual": false,
        "allow_failure": false,
        "user": { "id": 1, "name": "Administrator", "username": "root" },
        "runner": {
            "id": runner_id,
            "description": runner_description,
            "runner_type": "instance_type",
            "active": true,
            "is_shared": true,
            "tags": ["docker", "linux"]
        },
        "artifacts_file": { "filename": null, "size": null },
        "environment": null
    })
}

/// A pipeline event with the given attributes and nested builds.
#[must_use]
pub fn pipeline_event(
    pipeline_id: i64,
    status: &str,
    duration: i64,
    project_path: &str,
    builds: Vec<Value>,
) -> Value {
    json!({
        "object_kind": "pipeline",
        "object_attributes": {
            "id": pipeline_id,
            "iid": 7,
            "ref": "main",
            "tag": false,
            "sha": "bcbb5ec396a2c0f828686f14fac9b80b780504f2",
            "before_sha": "0000000000000000000000000000000000000000",
            "source": "push",
            "status": status,
            "detailed_status": status,
            "stages": ["build", "test", "deploy"],
            "created_at": "2026-01-15 09:57:40 UTC",
            "finished_at": "2026-01-15 09:59:52 UTC",
            "duration": duration,
            "queued_duration": 4,
            "variables": []
        },
        "merge_request": null,
        "user": { "id": 1, "name": "Administrator", "username": "root" },
        "project": {
            "id": 31,
            "name": "proj",
            "web_url": format!("{TEST_INSTANCE}/{project_path}"),
            "path_with_namespace": project_path,
            "default_branch": "main"
        },
        "commit": {
            "id": "bcbb5ec396a2c0f828686f14fac9b80b780504f2",
            "message": "test\n",
            "title": "test",
            "timestamp": "2026-01-15T09:57:30+00:00"
        },
        "builds": builds
    })
}

/// The pipeline 42 / build 7 / runner 3 delivery used across tests.
#[must_use]
pub fn concrete_pipeline_event() -> Value {
    pipeline_event(
        42,
        "success",
        120,
        "grp/proj",
        vec![pipeline_build(7, "success", 3, "shared-runner")],
    )
}

/// A job (build) event as GitLab sends it for `Job Hook`.
#[must_use]
pub fn build_event() -> Value {
    json!({
        "object_kind": "build",
        "ref": "main",
        "tag": false,
        "before_sha": "2293ada6b400935a1378653304eaf6221e0fdb8f",
        "sha": "2293ada6b400935a1378653304eaf6221e0fdb8f",
        "build_id": 1977,
        "build_name": "test",
        "build_stage": "test",
        "build_status": "failed",
        "build_created_at": "2026-01-15 09:58:00 UTC",
        "build_started_at": "2026-01-15 09:58:10 UTC",
        "build_finished_at": "2026-01-15 09:59:01 UTC",
        "build_duration": 51.270_413,
        "build_queued_duration": 1095.588_715,
        "build_allow_failure": false,
        "build_failure_reason": "script_failure",
        "pipeline_id": 2366,
        "runner": {
            "id": 380_987,
            "description": "shared-runners-manager-6.gitlab.com",
            "runner_type": "instance_type",
            "active": true,
            "is_shared": true,
            "tags": ["linux", "docker"]
        },
        "project_id": 380,
        "project_name": "gitlab-org/gitlab-test",
        "user": { "id": 3, "name": "User", "username": "user" },
        "commit": {
            "id": 2366,
            "sha": "2293ada6b400935a1378653304eaf6221e0fdb8f",
            "status": "failed"
        },
        "repository": {
            "name": "gitlab_test",
            "url": "git@192.168.64.1:gitlab-org/gitlab-test.git"
        },
        "environment": null
    })
}

/// A push event.
#[must_use]
pub fn push_event() -> Value {
    json!({
        "object_kind": "push",
        "event_name": "push",
        "before": "95790bf891e76fee5e1747ab589903a6a1f80f22",
        "after": "da1560886d4f094c3e6c9ef40349f7d38b5d27d7",
        "ref": "refs/heads/main",
        "user_name": "John Smith",
        "project_id": 15,
        "total_commits_count": 1,
        "commits": [{
            "id": "da1560886d4f094c3e6c9ef40349f7d38b5d27d7",
            "message": "Update README"
        }]
    })
}

/// An issue event, optionally confidential.
#[must_use]
pub fn issue_event(confidential: bool) -> Value {
    json!({
        "object_kind": "issue",
        "event_type": if confidential { "confidential_issue" } else { "issue" },
        "object_attributes": {
            "id": 301,
            "iid": 23,
            "title": "New API",
            "confidential": confidential
        }
    })
}

/// A system hook without `object_kind`.
#[must_use]
pub fn system_hook_event() -> Value {
    json!({
        "event_name": "project_create",
        "created_at": "2026-01-15T09:57:30Z",
        "name": "StoreCloud",
        "path_with_namespace": "jsmith/storecloud",
        "project_id": 74
    })
}

/// Valid JSON that matches no GitLab event shape.
#[must_use]
pub fn unrecognized_event() -> Value {
    json!({ "object_kind": "deployment_freeze", "id": 1 })
}

/// A fully-headered inbound event around `payload`.
#[must_use]
pub fn inbound_event(payload: &Value) -> InboundEvent {
    let body = payload.to_string();
    InboundEvent::new(
        GitlabHeaders {
            content_length: Some(body.len().to_string()),
            event_type: Some("Pipeline Hook".into()),
            instance: Some(TEST_INSTANCE.into()),
            token: Some(TEST_SECRET.into()),
            user_agent: Some("GitLab/17.0.0".into()),
            event_uuid: Some("3b0f8a3c-5d7e-4a55-9f0e-6c1d2e3f4a5b".into()),
        },
        true,
        body,
    )
}
