//! Shared application state.

use std::sync::Arc;

use webbook_core::policy::IngestPolicy;
use webbook_core::repository::EventRepository;
use webbook_core::secret::SharedSecret;

use crate::metrics::Metrics;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Append-only delivery store.
    pub event_repository: Arc<dyn EventRepository>,
    /// Process counters.
    pub metrics: Arc<Metrics>,
    /// Expected `X-Gitlab-Token`.
    pub secret: SharedSecret,
    /// Header and capture policy.
    pub policy: IngestPolicy,
    /// Maximum accepted body size in bytes.
    pub body_limit: usize,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        metrics: Arc<Metrics>,
        secret: SharedSecret,
        policy: IngestPolicy,
        body_limit: usize,
    ) -> Self {
        Self {
            event_repository,
            metrics,
            secret,
            policy,
            body_limit,
        }
    }
}
