//! Webbook API: the HTTP listener around the GitLab ingestion pipeline.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod reporter;
pub mod routes;
pub mod state;
