//! Delivery handler for the GitLab ingestion path.
//!
//! Orchestrates one webhook delivery: header policy, token check,
//! classification, normalization, persistence.

use std::borrow::Cow;

use tracing::{debug, error, info, warn};

use webbook_core::error::IngestError;
use webbook_core::event::InboundEvent;
use webbook_core::headers::GitlabHeaders;
use webbook_core::policy::{IngestPolicy, NonConformingPolicy};
use webbook_core::repository::{EventRepository, NewDelivery, RecordedDelivery};
use webbook_core::secret::SharedSecret;

use crate::application::normalize::{Normalized, normalize};
use crate::domain::classify::{Classification, classify, unescape_once};

/// One request as seen by the handler.
#[derive(Debug, Clone)]
pub struct Delivery<'a> {
    /// Extracted headers, or `None` when the request carried no GitLab
    /// header at all.
    pub headers: Option<GitlabHeaders>,
    /// Whether every required GitLab header was present.
    pub got_all_headers: bool,
    /// The raw body bytes.
    pub body: &'a [u8],
}

/// Result of a handled delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Empty body; nothing written.
    NoPayload,
    /// JSON of an unrecognized kind. `record` is set when raw capture is on.
    NotFound {
        /// The raw row, if captured.
        record: Option<RecordedDelivery>,
    },
    /// A recognized event, written with its derived rows.
    Stored {
        /// Event kind name.
        kind: &'static str,
        /// The raw row.
        record: RecordedDelivery,
        /// Normalized fields.
        normalized: Normalized,
    },
}

impl IngestOutcome {
    /// Stable label used in responses and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoPayload => "no_payload",
            Self::NotFound { .. } => "not_found",
            Self::Stored { .. } => "stored",
        }
    }
}

fn resolve_headers(
    delivery_headers: Option<GitlabHeaders>,
    policy: &IngestPolicy,
    secret: &SharedSecret,
) -> Result<GitlabHeaders, IngestError> {
    match delivery_headers {
        Some(headers) => {
            let authorized = headers
                .token
                .as_deref()
                .is_some_and(|token| secret.verify(token));
            if !authorized {
                warn!(instance = ?headers.instance, "rejecting delivery with invalid token");
                return Err(IngestError::InvalidToken);
            }
            Ok(headers)
        }
        None => match policy.non_conforming {
            NonConformingPolicy::Reject => {
                warn!("rejecting request without gitlab headers");
                Err(IngestError::MissingHeaders)
            }
            NonConformingPolicy::Persist => {
                warn!("request without gitlab headers, continuing with empty header fields");
                Ok(GitlabHeaders::default())
            }
        },
    }
}

async fn append(
    event: InboundEvent,
    normalized: Option<&Normalized>,
    repo: &dyn EventRepository,
) -> Result<RecordedDelivery, IngestError> {
    let delivery = NewDelivery {
        event,
        resources: normalized.map(Normalized::derived_resources).unwrap_or_default(),
    };
    repo.append_delivery(&delivery).await.inspect_err(|e| {
        error!(
            error = %e,
            event_uuid = ?delivery.event.event_uuid,
            "failed to persist delivery"
        );
    })
}

/// Handles one delivery end to end.
///
/// # Errors
///
/// Returns `IngestError::MissingHeaders` or `IngestError::InvalidToken` when
/// the request fails the header policy, `IngestError::MalformedPayload` when
/// the body cannot be classified, and `IngestError::Storage` when the write
/// fails. No row is written on any error path.
pub async fn handle_delivery(
    delivery: Delivery<'_>,
    policy: &IngestPolicy,
    secret: &SharedSecret,
    repo: &dyn EventRepository,
) -> Result<IngestOutcome, IngestError> {
    let headers = resolve_headers(delivery.headers, policy, secret)?;

    let body = unescape_once(delivery.body);
    if matches!(body, Cow::Owned(_)) {
        debug!(event_uuid = ?headers.event_uuid, "unescaped double-encoded body");
    }

    let classification = classify(&body).map_err(|e| {
        warn!(error = %e, event_uuid = ?headers.event_uuid, "dropping undecodable payload");
        IngestError::MalformedPayload(e.to_string())
    })?;

    // A body that decoded as JSON is valid UTF-8.
    let payload = || {
        String::from_utf8(body.to_vec())
            .map_err(|e| IngestError::MalformedPayload(e.to_string()))
    };

    match classification {
        Classification::NoPayload => {
            info!(event_uuid = ?headers.event_uuid, "no body supplied");
            Ok(IngestOutcome::NoPayload)
        }
        Classification::NotFound => {
            info!(
                event_uuid = ?headers.event_uuid,
                event_type = ?headers.event_type,
                captured = policy.capture_unrecognized,
                "payload matches no known event kind"
            );
            let record = if policy.capture_unrecognized {
                let event = InboundEvent::new(headers, delivery.got_all_headers, payload()?);
                Some(append(event, None, repo).await?)
            } else {
                None
            };
            Ok(IngestOutcome::NotFound { record })
        }
        Classification::Recognized(kind) => {
            let name = kind.name();
            let normalized = normalize(&kind);
            normalized.emit(name);

            let event = InboundEvent::new(headers, delivery.got_all_headers, payload()?);
            let record = append(event, Some(&normalized), repo).await?;
            info!(kind = name, record_id = %record.record_id, "delivery stored");

            Ok(IngestOutcome::Stored {
                kind: name,
                record,
                normalized,
            })
        }
    }
}
