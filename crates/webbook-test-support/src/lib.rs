//! Shared test mocks and payload fixtures for the Webbook GitLab webhook
//! recorder.

pub mod fixtures;
mod repository;

pub use repository::{FailingEventRepository, RecordingEventRepository};
