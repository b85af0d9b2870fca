//! Event repository abstraction.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::IngestError;
use crate::event::InboundEvent;

/// Store-assigned identity of a raw delivery row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which derived relation a resource row lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTable {
    /// `gitlab_pipeline`
    Pipeline,
    /// `gitlab_job`
    Job,
}

/// A normalized descriptor written next to the raw row.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedResource {
    /// Target relation.
    pub table: ResourceTable,
    /// JSON descriptor stored as `pod_resource` text.
    pub descriptor: serde_json::Value,
}

/// Everything written for one accepted delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDelivery {
    /// The raw delivery row.
    pub event: InboundEvent,
    /// Derived pipeline/job rows. Empty for kinds without a projection.
    pub resources: Vec<DerivedResource>,
}

/// What the store assigned to a committed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedDelivery {
    /// Row identity in `gitlab_webhooks`.
    pub record_id: RecordId,
    /// Server-assigned insertion time.
    pub created_at: DateTime<Utc>,
}

/// Append-only persistence for webhook deliveries.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Appends the raw row and its derived rows atomically.
    ///
    /// Duplicate `event_uuid` values are accepted as separate rows.
    async fn append_delivery(
        &self,
        delivery: &NewDelivery,
    ) -> Result<RecordedDelivery, IngestError>;
}
