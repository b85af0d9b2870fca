//! GitLab webhook receiver.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::{Json, Router, routing::any};
use http_body_util::LengthLimitError;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use webbook_core::error::IngestError;
use webbook_core::headers::{
    GitlabHeaders, REQUIRED_GITLAB_HEADERS, has_all_headers, has_required_headers,
};
use webbook_core::repository::RecordId;
use webbook_gitlab::application::ingest::{Delivery, IngestOutcome, handle_delivery};

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for a handled delivery.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// `stored`, `no_payload` or `not_found`.
    pub outcome: &'static str,
    /// Id of the raw row, when one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    /// Event kind, for stored deliveries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl From<&IngestOutcome> for IngestResponse {
    fn from(outcome: &IngestOutcome) -> Self {
        let (record_id, kind) = match outcome {
            IngestOutcome::NoPayload => (None, None),
            IngestOutcome::NotFound { record } => (record.map(|r| r.record_id), None),
            IngestOutcome::Stored { kind, record, .. } => (Some(record.record_id), Some(*kind)),
        };
        Self {
            outcome: outcome.label(),
            record_id,
            kind,
        }
    }
}

fn body_error(err: &axum::Error, limit: usize) -> IngestError {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = cause {
        if e.is::<LengthLimitError>() {
            return IngestError::PayloadTooLarge { limit };
        }
        cause = e.source();
    }
    IngestError::UnreadableBody(err.to_string())
}

async fn ingest(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> Result<IngestOutcome, IngestError> {
    let names: Vec<&str> = headers.keys().map(HeaderName::as_str).collect();
    let gitlab = has_required_headers(&REQUIRED_GITLAB_HEADERS, names.iter().copied());
    let got_all_headers = has_all_headers(&REQUIRED_GITLAB_HEADERS, names.iter().copied());

    let extracted = if gitlab {
        Some(GitlabHeaders::extract(|name| headers.get(name).map(HeaderValue::as_bytes))?)
    } else {
        None
    };

    let bytes = axum::body::to_bytes(body, state.body_limit)
        .await
        .map_err(|e| body_error(&e, state.body_limit))?;

    handle_delivery(
        Delivery {
            headers: extracted,
            got_all_headers,
            body: &bytes,
        },
        &state.policy,
        &state.secret,
        &*state.event_repository,
    )
    .await
}

/// Any method on `/`.
#[instrument(skip_all, fields(delivery_id = %Uuid::new_v4()))]
async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<IngestResponse>, ApiError> {
    match ingest(&state, &headers, body).await {
        Ok(outcome) => {
            state.metrics.record_outcome(&outcome);
            info!(outcome = outcome.label(), "delivery handled");
            Ok(Json(IngestResponse::from(&outcome)))
        }
        Err(e) => {
            state.metrics.record_rejection(&e);
            info!(error = %e, "delivery rejected");
            Err(ApiError(e))
        }
    }
}

/// Returns the webhook router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", any(receive_webhook))
}
