//! Test repositories: mock `EventRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use webbook_core::error::IngestError;
use webbook_core::repository::{EventRepository, NewDelivery, RecordId, RecordedDelivery};

/// A repository that records every appended delivery and hands out
/// sequential record ids starting at 1, all stamped with a fixed time.
#[derive(Debug, Default)]
pub struct RecordingEventRepository {
    appended: Mutex<Vec<NewDelivery>>,
}

impl RecordingEventRepository {
    /// Create an empty recording repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all deliveries that were appended.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended(&self) -> Vec<NewDelivery> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn append_delivery(
        &self,
        delivery: &NewDelivery,
    ) -> Result<RecordedDelivery, IngestError> {
        let mut appended = self.appended.lock().unwrap();
        appended.push(delivery.clone());
        let id = i64::try_from(appended.len()).unwrap();
        Ok(RecordedDelivery {
            record_id: RecordId(id),
            created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        })
    }
}

/// A repository whose writes always fail with a storage error. Useful for
/// testing the 500 path.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn append_delivery(
        &self,
        _delivery: &NewDelivery,
    ) -> Result<RecordedDelivery, IngestError> {
        Err(IngestError::Storage("database is locked".into()))
    }
}
