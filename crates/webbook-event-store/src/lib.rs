//! Webbook Event Store: SQLite persistence for webhook deliveries.
//!
//! Owns the schema, its idempotent initialization, and the append-only
//! `EventRepository` implementation.

pub mod error;
pub mod schema;
pub mod sqlite_event_repository;

pub use error::StoreError;
pub use sqlite_event_repository::{SqliteEventRepository, open_or_create_store};
