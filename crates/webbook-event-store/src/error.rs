//! Startup errors for the delivery store.

use thiserror::Error;

/// Raised while opening or initializing the store. Always fatal at startup.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened or created.
    #[error("cannot open store at {location}: {source}")]
    Open {
        /// The store location as configured.
        location: String,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A relation could not be created.
    #[error("cannot create relation {relation}: {source}")]
    Schema {
        /// The relation whose DDL failed.
        relation: &'static str,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },
}
