//! Delivery handling built on the domain classifier.

pub mod ingest;
pub mod normalize;
