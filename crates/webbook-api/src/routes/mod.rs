//! HTTP routes.

pub mod health;
pub mod metrics;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

/// Every route the listener serves, without middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(metrics::router())
        .merge(webhook::router())
}
